//! Add-in ABI - the fixed native surface of an external component
//!
//! This crate holds everything that touches raw memory or C calling
//! conventions, and nothing that knows about the host's value system:
//!
//! - `Variant` / `VariantBuffer` - the 16-byte native value layout
//! - `WStr` - borrowed UTF-16 strings crossing the boundary
//! - `NativeSurface` - the component entry points as a Rust trait
//! - `ProxyApi` - `NativeSurface` over C entry points in a shared library
//! - `Library` - cross-platform dynamic library loading
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use addin_abi::{Library, ProxyApi};
//!
//! let library = Arc::new(Library::open("./libprinter.so")?);
//! let surface = ProxyApi::load(library)?;
//! ```

pub mod error;
pub mod loader;
pub mod proxy;
pub mod surface;
pub mod variant;

pub use error::{AbiError, AbiResult};
pub use loader::Library;
pub use proxy::{ProxyApi, ProxyFns, StringSink, VariantSink, ENTRY_POINTS};
pub use surface::{
    CallbackTable, ErrorCallback, EventCallback, NativeSurface, RawHandle, StatusCallback,
};
pub use variant::{encode_wide, Variant, VariantBuffer, VariantKind, VariantView, WStr};
