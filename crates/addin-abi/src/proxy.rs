//! ProxyApi - `NativeSurface` over C entry points
//!
//! A component library exports one C function per entry point. `ProxyFns`
//! holds the resolved pointers; `ProxyApi` wraps them together with the
//! library that keeps them mapped.
//!
//! Native-owned results come back through sink callbacks: the host passes a
//! sink function plus an opaque context, and the native side invokes the sink
//! (at most once) before returning. The context is only valid for the
//! duration of the entry point call.

use std::ffi::c_void;
use std::sync::Arc;

use crate::error::AbiResult;
use crate::loader::Library;
use crate::surface::{CallbackTable, NativeSurface, RawHandle};
use crate::variant::{encode_wide, Variant, VariantBuffer, WStr};

/// Receives a native-owned string: `(ctx, value)`
pub type StringSink = unsafe extern "C" fn(ctx: *mut c_void, value: WStr);

/// Receives a native-owned variant: `(ctx, value)`
pub type VariantSink = unsafe extern "C" fn(ctx: *mut c_void, value: *const Variant);

/// Exported entry point names, in `ProxyFns` field order
pub const ENTRY_POINTS: [&str; 18] = [
    "addin_create_instance",
    "addin_destroy_instance",
    "addin_find_property",
    "addin_is_property_readable",
    "addin_is_property_writable",
    "addin_property_count",
    "addin_property_name",
    "addin_get_property",
    "addin_set_property",
    "addin_method_count",
    "addin_find_method",
    "addin_method_name",
    "addin_has_return_value",
    "addin_parameter_count",
    "addin_has_default_value",
    "addin_get_default_value",
    "addin_call_procedure",
    "addin_call_function",
];

/// Resolved component entry points.
///
/// `create_instance` receives the callback table by pointer; the native side
/// must copy it; the pointer is not valid after the call returns.
#[derive(Clone, Copy)]
pub struct ProxyFns {
    pub create_instance: unsafe extern "C" fn(
        module: *mut c_void,
        name: WStr,
        callbacks: *const CallbackTable,
    ) -> *mut c_void,
    pub destroy_instance: unsafe extern "C" fn(handle: *mut c_void) -> bool,
    pub find_property: unsafe extern "C" fn(handle: *mut c_void, name: WStr) -> i32,
    pub is_property_readable: unsafe extern "C" fn(handle: *mut c_void, index: i32) -> bool,
    pub is_property_writable: unsafe extern "C" fn(handle: *mut c_void, index: i32) -> bool,
    pub property_count: unsafe extern "C" fn(handle: *mut c_void) -> i32,
    pub property_name: unsafe extern "C" fn(
        handle: *mut c_void,
        index: i32,
        alias: bool,
        sink: StringSink,
        ctx: *mut c_void,
    ),
    pub get_property: unsafe extern "C" fn(
        handle: *mut c_void,
        index: i32,
        sink: VariantSink,
        ctx: *mut c_void,
    ) -> bool,
    pub set_property:
        unsafe extern "C" fn(handle: *mut c_void, index: i32, value: *const Variant) -> bool,
    pub method_count: unsafe extern "C" fn(handle: *mut c_void) -> i32,
    pub find_method: unsafe extern "C" fn(handle: *mut c_void, name: WStr) -> i32,
    pub method_name: unsafe extern "C" fn(
        handle: *mut c_void,
        index: i32,
        alias: bool,
        sink: StringSink,
        ctx: *mut c_void,
    ),
    pub has_return_value: unsafe extern "C" fn(handle: *mut c_void, index: i32) -> bool,
    pub parameter_count: unsafe extern "C" fn(handle: *mut c_void, index: i32) -> i32,
    pub has_default_value:
        unsafe extern "C" fn(handle: *mut c_void, method: i32, param: i32) -> bool,
    pub get_default_value: unsafe extern "C" fn(
        handle: *mut c_void,
        method: i32,
        param: i32,
        sink: VariantSink,
        ctx: *mut c_void,
    ) -> bool,
    pub call_procedure: unsafe extern "C" fn(
        handle: *mut c_void,
        method: i32,
        args: *mut Variant,
        count: u32,
    ) -> bool,
    pub call_function: unsafe extern "C" fn(
        handle: *mut c_void,
        method: i32,
        args: *mut Variant,
        count: u32,
        sink: VariantSink,
        ctx: *mut c_void,
    ) -> bool,
}

impl ProxyFns {
    /// Resolve every entry point from a loaded library
    pub fn resolve(library: &Library) -> AbiResult<Self> {
        unsafe {
            Ok(Self {
                create_instance: library.get(ENTRY_POINTS[0])?,
                destroy_instance: library.get(ENTRY_POINTS[1])?,
                find_property: library.get(ENTRY_POINTS[2])?,
                is_property_readable: library.get(ENTRY_POINTS[3])?,
                is_property_writable: library.get(ENTRY_POINTS[4])?,
                property_count: library.get(ENTRY_POINTS[5])?,
                property_name: library.get(ENTRY_POINTS[6])?,
                get_property: library.get(ENTRY_POINTS[7])?,
                set_property: library.get(ENTRY_POINTS[8])?,
                method_count: library.get(ENTRY_POINTS[9])?,
                find_method: library.get(ENTRY_POINTS[10])?,
                method_name: library.get(ENTRY_POINTS[11])?,
                has_return_value: library.get(ENTRY_POINTS[12])?,
                parameter_count: library.get(ENTRY_POINTS[13])?,
                has_default_value: library.get(ENTRY_POINTS[14])?,
                get_default_value: library.get(ENTRY_POINTS[15])?,
                call_procedure: library.get(ENTRY_POINTS[16])?,
                call_function: library.get(ENTRY_POINTS[17])?,
            })
        }
    }
}

// ============================================================================
// Sink trampolines
// ============================================================================

unsafe extern "C" fn string_sink(ctx: *mut c_void, value: WStr) {
    if let Some(out) = (ctx as *mut String).as_mut() {
        *out = value.to_string_lossy();
    }
}

unsafe extern "C" fn variant_sink(ctx: *mut c_void, value: *const Variant) {
    let sink = ctx as *mut &mut dyn FnMut(&Variant);
    if let (Some(sink), Some(value)) = (sink.as_mut(), value.as_ref()) {
        sink(value);
    }
}

// ============================================================================
// ProxyApi
// ============================================================================

/// `NativeSurface` backed by C entry points
pub struct ProxyApi {
    fns: ProxyFns,
    module: *mut c_void,
    library: Option<Arc<Library>>,
}

// `module` is only handed back to the library that produced it.
unsafe impl Send for ProxyApi {}
unsafe impl Sync for ProxyApi {}

impl ProxyApi {
    /// Resolve the entry points of a loaded library. The library stays
    /// mapped for as long as this surface lives.
    pub fn load(library: Arc<Library>) -> AbiResult<Self> {
        let fns = ProxyFns::resolve(&library)?;
        Ok(Self {
            fns,
            module: library.raw_handle(),
            library: Some(library),
        })
    }

    /// Surface over entry points linked into the current image
    pub fn from_fns(fns: ProxyFns) -> Self {
        Self {
            fns,
            module: std::ptr::null_mut(),
            library: None,
        }
    }

    /// The library backing this surface, if any
    pub fn library(&self) -> Option<&Arc<Library>> {
        self.library.as_ref()
    }

    fn read_name(
        &self,
        f: unsafe extern "C" fn(*mut c_void, i32, bool, StringSink, *mut c_void),
        handle: RawHandle,
        index: i32,
        alias: bool,
    ) -> String {
        let mut out = String::new();
        unsafe {
            f(
                handle.as_ptr(),
                index,
                alias,
                string_sink,
                &mut out as *mut String as *mut c_void,
            )
        };
        out
    }
}

/// Erase a sink closure into a context pointer for `variant_sink`.
/// The pointer is valid while `slot` is.
fn sink_ctx(slot: &mut &mut dyn FnMut(&Variant)) -> *mut c_void {
    slot as *mut &mut dyn FnMut(&Variant) as *mut c_void
}

impl NativeSurface for ProxyApi {
    fn create_instance(&self, component: &str, callbacks: &CallbackTable) -> Option<RawHandle> {
        let name = encode_wide(component);
        let handle = unsafe {
            (self.fns.create_instance)(self.module, WStr::new(&name), callbacks as *const _)
        };
        if handle.is_null() {
            None
        } else {
            Some(RawHandle::from_ptr(handle))
        }
    }

    fn destroy_instance(&self, handle: RawHandle) -> bool {
        unsafe { (self.fns.destroy_instance)(handle.as_ptr()) }
    }

    fn find_property(&self, handle: RawHandle, name: &str) -> i32 {
        let name = encode_wide(name);
        unsafe { (self.fns.find_property)(handle.as_ptr(), WStr::new(&name)) }
    }

    fn is_property_readable(&self, handle: RawHandle, index: i32) -> bool {
        unsafe { (self.fns.is_property_readable)(handle.as_ptr(), index) }
    }

    fn is_property_writable(&self, handle: RawHandle, index: i32) -> bool {
        unsafe { (self.fns.is_property_writable)(handle.as_ptr(), index) }
    }

    fn property_count(&self, handle: RawHandle) -> i32 {
        unsafe { (self.fns.property_count)(handle.as_ptr()) }
    }

    fn property_name(&self, handle: RawHandle, index: i32, alias: bool) -> String {
        self.read_name(self.fns.property_name, handle, index, alias)
    }

    fn get_property(&self, handle: RawHandle, index: i32, sink: &mut dyn FnMut(&Variant)) -> bool {
        let mut slot = sink;
        unsafe { (self.fns.get_property)(handle.as_ptr(), index, variant_sink, sink_ctx(&mut slot)) }
    }

    fn set_property(&self, handle: RawHandle, index: i32, value: &Variant) -> bool {
        unsafe { (self.fns.set_property)(handle.as_ptr(), index, value as *const Variant) }
    }

    fn method_count(&self, handle: RawHandle) -> i32 {
        unsafe { (self.fns.method_count)(handle.as_ptr()) }
    }

    fn find_method(&self, handle: RawHandle, name: &str) -> i32 {
        let name = encode_wide(name);
        unsafe { (self.fns.find_method)(handle.as_ptr(), WStr::new(&name)) }
    }

    fn method_name(&self, handle: RawHandle, index: i32, alias: bool) -> String {
        self.read_name(self.fns.method_name, handle, index, alias)
    }

    fn has_return_value(&self, handle: RawHandle, index: i32) -> bool {
        unsafe { (self.fns.has_return_value)(handle.as_ptr(), index) }
    }

    fn parameter_count(&self, handle: RawHandle, index: i32) -> i32 {
        unsafe { (self.fns.parameter_count)(handle.as_ptr(), index) }
    }

    fn has_default_value(&self, handle: RawHandle, method: i32, param: i32) -> bool {
        unsafe { (self.fns.has_default_value)(handle.as_ptr(), method, param) }
    }

    fn get_default_value(
        &self,
        handle: RawHandle,
        method: i32,
        param: i32,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool {
        let mut slot = sink;
        unsafe {
            (self.fns.get_default_value)(
                handle.as_ptr(),
                method,
                param,
                variant_sink,
                sink_ctx(&mut slot),
            )
        }
    }

    fn call_procedure(&self, handle: RawHandle, method: i32, args: &mut VariantBuffer) -> bool {
        let count = args.len() as u32;
        unsafe { (self.fns.call_procedure)(handle.as_ptr(), method, args.as_mut_ptr(), count) }
    }

    fn call_function(
        &self,
        handle: RawHandle,
        method: i32,
        args: &mut VariantBuffer,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool {
        let count = args.len() as u32;
        let mut slot = sink;
        unsafe {
            (self.fns.call_function)(
                handle.as_ptr(),
                method,
                args.as_mut_ptr(),
                count,
                variant_sink,
                sink_ctx(&mut slot),
            )
        }
    }
}
