//! Runtime error types.

use addin_abi::AbiError;

/// Result type for component operations
pub type AddinResult<T> = Result<T, AddinError>;

/// Failures surfaced to the calling script.
///
/// Every variant carries the offending name or index.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddinError {
    /// Property name (or `#index`) absent from the native table
    #[error("Property not found: {name}")]
    PropertyNotFound {
        /// Requested name
        name: String,
    },

    /// Method name (or `#index`) absent from the native table
    #[error("Method not found: {name}")]
    MethodNotFound {
        /// Requested name
        name: String,
    },

    /// Property exists but is write-only
    #[error("Property '{name}' (#{index}) is not readable")]
    PropertyNotReadable {
        /// Property name
        name: String,
        /// Native index
        index: usize,
    },

    /// Property exists but is read-only
    #[error("Property '{name}' (#{index}) is not writable")]
    PropertyNotWritable {
        /// Property name
        name: String,
        /// Native index
        index: usize,
    },

    /// Procedure-only method called for a value
    #[error("Method '{name}' (#{index}) is a procedure and returns no value")]
    NotAFunction {
        /// Method name
        name: String,
        /// Native index
        index: usize,
    },

    /// Argument omitted for a parameter without a native default
    #[error("Argument {param} of method '{method}' is required (no default value)")]
    NoDefaultValue {
        /// Method name
        method: String,
        /// Zero-based parameter position
        param: usize,
    },

    /// More arguments supplied than the method declares
    #[error("Method '{method}' takes {expected} arguments, {got} given")]
    TooManyArguments {
        /// Method name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Value has no native representation, or native value has no host one
    #[error("Cannot marshal {kind} value: {reason}")]
    Marshalling {
        /// Kind of the offending value
        kind: String,
        /// What went wrong
        reason: String,
    },

    /// Operation on a disposed component
    #[error("Component '{component}' is disposed; cannot {operation}")]
    UseAfterDispose {
        /// Component type name
        component: String,
        /// Attempted operation
        operation: &'static str,
    },

    /// Native side reported failure
    #[error("Native call {operation} failed for '{target}'")]
    NativeCallFailed {
        /// Entry point
        operation: &'static str,
        /// Property or method name
        target: String,
    },

    /// Native side refused to create the instance
    #[error("Failed to create component '{component}'")]
    CreateFailed {
        /// Requested component name
        component: String,
    },

    /// ABI-level failure (loading, buffers)
    #[error("{0}")]
    Abi(#[from] AbiError),
}
