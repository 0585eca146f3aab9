//! Error types for the add-in ABI layer

/// Result type for ABI operations
pub type AbiResult<T> = Result<T, AbiError>;

/// Errors raised while loading a component library or handling native buffers
#[derive(Debug, Clone, thiserror::Error)]
pub enum AbiError {
    /// Library file not found or could not be loaded
    #[error("Library not found: {path}")]
    LibraryNotFound {
        /// Path that was attempted (with the platform reason appended)
        path: String,
    },

    /// Entry point not exported by the library
    #[error("Symbol not found: {symbol} in {library}")]
    SymbolNotFound {
        /// Symbol name that was not found
        symbol: String,
        /// Library path
        library: String,
    },

    /// Invalid path encoding
    #[error("Invalid UTF-8 in path: {0}")]
    InvalidPath(String),

    /// Platform-specific error
    #[error("Platform error: {0}")]
    Platform(String),

    /// The native side produced a variant with a tag this host does not know
    #[error("Unknown variant tag: {0}")]
    UnknownVariantTag(u16),

    /// Write to a slot past the end of a variant buffer
    #[error("Variant slot {slot} out of range (buffer has {len} slots)")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Buffer length
        len: usize,
    },

    /// Payload does not fit the 32-bit length field of a variant
    #[error("Variant payload too large: {0} units")]
    PayloadTooLarge(usize),
}
