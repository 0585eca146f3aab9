//! NativeSurface trait - the fixed component entry-point contract
//!
//! A component is reached only through these entry points. The runtime
//! programs against this trait; `ProxyApi` implements it over a shared
//! library, and tests implement it in memory.
//!
//! Values owned by the native side (property values, defaults, function
//! results, names) are handed to a sink closure while the native memory is
//! still valid. Nothing is read after the entry point returns.

use std::ffi::c_void;

use crate::variant::{Variant, VariantBuffer, WStr};

/// Opaque handle to a live component instance
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHandle(*mut c_void);

// The handle is an address the native side interprets; the runtime never
// dereferences it.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    /// Wrap a raw native pointer
    #[inline]
    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// The null handle
    #[inline]
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Raw pointer for passing back to the native side
    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Check for the null handle
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

// ============================================================================
// Native callbacks
// ============================================================================

/// Error channel: `(user_data, code, source, description, extra)`
pub type ErrorCallback =
    unsafe extern "C" fn(user_data: *mut c_void, code: u16, source: WStr, description: WStr, extra: i32);

/// Event channel: `(user_data, source, message, data)`
pub type EventCallback =
    unsafe extern "C" fn(user_data: *mut c_void, source: WStr, message: WStr, data: WStr);

/// Status text channel: `(user_data, text)`
pub type StatusCallback = unsafe extern "C" fn(user_data: *mut c_void, text: WStr);

/// Callback slots handed to the native side at instance creation.
///
/// The native side may invoke any of these at any time, from any thread,
/// until the instance is destroyed. `user_data` is passed back verbatim.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CallbackTable {
    /// Opaque host pointer passed back as the first callback argument
    pub user_data: *mut c_void,
    /// Error channel
    pub on_error: ErrorCallback,
    /// Event channel
    pub on_event: EventCallback,
    /// Status text channel
    pub on_status: StatusCallback,
}

// `user_data` must point at state that is safe to touch from any thread;
// whoever builds the table upholds that.
unsafe impl Send for CallbackTable {}
unsafe impl Sync for CallbackTable {}

// ============================================================================
// NativeSurface
// ============================================================================

/// The component entry points.
///
/// Indices are the native side's own numbering; a negative result from
/// `find_property` / `find_method` means "not found".
pub trait NativeSurface: Send + Sync {
    /// Create a component instance by name. `None` if the native side refuses.
    fn create_instance(&self, component: &str, callbacks: &CallbackTable) -> Option<RawHandle>;

    /// Destroy an instance. Returns false if the native side reports a failure.
    fn destroy_instance(&self, handle: RawHandle) -> bool;

    /// Find a property index by name (negative = not found)
    fn find_property(&self, handle: RawHandle, name: &str) -> i32;

    /// Whether a property can be read
    fn is_property_readable(&self, handle: RawHandle, index: i32) -> bool;

    /// Whether a property can be written
    fn is_property_writable(&self, handle: RawHandle, index: i32) -> bool;

    /// Number of properties
    fn property_count(&self, handle: RawHandle) -> i32;

    /// Property name (`alias = true` for the secondary name)
    fn property_name(&self, handle: RawHandle, index: i32, alias: bool) -> String;

    /// Read a property; the value is passed to `sink`
    fn get_property(&self, handle: RawHandle, index: i32, sink: &mut dyn FnMut(&Variant)) -> bool;

    /// Write a property
    fn set_property(&self, handle: RawHandle, index: i32, value: &Variant) -> bool;

    /// Number of methods
    fn method_count(&self, handle: RawHandle) -> i32;

    /// Find a method index by name (negative = not found)
    fn find_method(&self, handle: RawHandle, name: &str) -> i32;

    /// Method name (`alias = true` for the secondary name)
    fn method_name(&self, handle: RawHandle, index: i32, alias: bool) -> String;

    /// Whether the method returns a value
    fn has_return_value(&self, handle: RawHandle, index: i32) -> bool;

    /// Declared parameter count
    fn parameter_count(&self, handle: RawHandle, index: i32) -> i32;

    /// Whether a parameter has a native default
    fn has_default_value(&self, handle: RawHandle, method: i32, param: i32) -> bool;

    /// Fetch a parameter default; the value is passed to `sink`
    fn get_default_value(
        &self,
        handle: RawHandle,
        method: i32,
        param: i32,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool;

    /// Invoke a method, discarding any result
    fn call_procedure(&self, handle: RawHandle, method: i32, args: &mut VariantBuffer) -> bool;

    /// Invoke a method; the result is passed to `sink`
    fn call_function(
        &self,
        handle: RawHandle,
        method: i32,
        args: &mut VariantBuffer,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool;
}
