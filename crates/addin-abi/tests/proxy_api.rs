//! ProxyApi driven through real `extern "C"` entry points.
//!
//! The component below is linked into the test binary and handed to
//! `ProxyApi::from_fns`, so every call goes through the same C ABI a shared
//! library would use.

use std::ffi::c_void;
use std::ptr;

use addin_abi::{
    encode_wide, CallbackTable, NativeSurface, ProxyApi, ProxyFns, StringSink, Variant,
    VariantBuffer, VariantSink, VariantView, WStr,
};
use parking_lot::Mutex;

// ============================================================================
// A tiny "Counter" component
// ============================================================================

struct Instance {
    count: i32,
    callbacks: CallbackTable,
}

unsafe fn instance<'a>(handle: *mut c_void) -> &'a mut Instance {
    &mut *(handle as *mut Instance)
}

unsafe fn send_string(sink: StringSink, ctx: *mut c_void, s: &str) {
    let units = encode_wide(s);
    sink(ctx, WStr::new(&units));
}

unsafe fn send_str_variant(sink: VariantSink, ctx: *mut c_void, s: &str) {
    let units = encode_wide(s);
    let value = Variant::wstr_raw(units.as_ptr(), units.len() as u32);
    sink(ctx, &value);
}

unsafe fn arg_string(args: *mut Variant, count: u32, index: usize) -> Option<String> {
    let args = std::slice::from_raw_parts(args, count as usize);
    match args.get(index)?.view().ok()? {
        VariantView::WStr(units) => Some(String::from_utf16_lossy(units)),
        _ => None,
    }
}

unsafe extern "C" fn create_instance(
    _module: *mut c_void,
    name: WStr,
    callbacks: *const CallbackTable,
) -> *mut c_void {
    if name.to_string_lossy() != "Counter" || callbacks.is_null() {
        return ptr::null_mut();
    }
    Box::into_raw(Box::new(Instance {
        count: 0,
        callbacks: *callbacks,
    })) as *mut c_void
}

unsafe extern "C" fn destroy_instance(handle: *mut c_void) -> bool {
    drop(Box::from_raw(handle as *mut Instance));
    true
}

unsafe extern "C" fn find_property(_handle: *mut c_void, name: WStr) -> i32 {
    match name.to_string_lossy().as_str() {
        "Count" | "Counter" => 0,
        _ => -1,
    }
}

unsafe extern "C" fn is_property_readable(_handle: *mut c_void, index: i32) -> bool {
    index == 0
}

unsafe extern "C" fn is_property_writable(_handle: *mut c_void, index: i32) -> bool {
    index == 0
}

unsafe extern "C" fn property_count(_handle: *mut c_void) -> i32 {
    1
}

unsafe extern "C" fn property_name(
    _handle: *mut c_void,
    index: i32,
    alias: bool,
    sink: StringSink,
    ctx: *mut c_void,
) {
    if index == 0 {
        send_string(sink, ctx, if alias { "Counter" } else { "Count" });
    }
}

unsafe extern "C" fn get_property(
    handle: *mut c_void,
    index: i32,
    sink: VariantSink,
    ctx: *mut c_void,
) -> bool {
    if index != 0 {
        return false;
    }
    let value = Variant::i4(instance(handle).count);
    sink(ctx, &value);
    true
}

unsafe extern "C" fn set_property(handle: *mut c_void, index: i32, value: *const Variant) -> bool {
    match (index, (*value).view()) {
        (0, Ok(VariantView::I4(i))) => {
            instance(handle).count = i;
            true
        }
        _ => false,
    }
}

unsafe extern "C" fn method_count(_handle: *mut c_void) -> i32 {
    2
}

unsafe extern "C" fn find_method(_handle: *mut c_void, name: WStr) -> i32 {
    match name.to_string_lossy().as_str() {
        "Greet" => 0,
        "Reset" => 1,
        _ => -1,
    }
}

unsafe extern "C" fn method_name(
    _handle: *mut c_void,
    index: i32,
    _alias: bool,
    sink: StringSink,
    ctx: *mut c_void,
) {
    match index {
        0 => send_string(sink, ctx, "Greet"),
        1 => send_string(sink, ctx, "Reset"),
        _ => {}
    }
}

unsafe extern "C" fn has_return_value(_handle: *mut c_void, index: i32) -> bool {
    index == 0
}

unsafe extern "C" fn parameter_count(_handle: *mut c_void, index: i32) -> i32 {
    if index == 0 {
        2
    } else {
        0
    }
}

unsafe extern "C" fn has_default_value(_handle: *mut c_void, method: i32, param: i32) -> bool {
    method == 0 && param == 1
}

unsafe extern "C" fn get_default_value(
    _handle: *mut c_void,
    method: i32,
    param: i32,
    sink: VariantSink,
    ctx: *mut c_void,
) -> bool {
    if method == 0 && param == 1 {
        send_str_variant(sink, ctx, "!");
        true
    } else {
        false
    }
}

unsafe extern "C" fn call_procedure(
    handle: *mut c_void,
    method: i32,
    _args: *mut Variant,
    _count: u32,
) -> bool {
    if method != 1 {
        return false;
    }
    let instance = instance(handle);
    instance.count = 0;
    let text = encode_wide("reset");
    (instance.callbacks.on_status)(instance.callbacks.user_data, WStr::new(&text));
    true
}

unsafe extern "C" fn call_function(
    _handle: *mut c_void,
    method: i32,
    args: *mut Variant,
    count: u32,
    sink: VariantSink,
    ctx: *mut c_void,
) -> bool {
    if method != 0 || count != 2 {
        return false;
    }
    let (Some(name), Some(punct)) = (arg_string(args, count, 0), arg_string(args, count, 1)) else {
        return false;
    };
    send_str_variant(sink, ctx, &format!("Hello, {}{}", name, punct));
    true
}

fn counter_fns() -> ProxyFns {
    ProxyFns {
        create_instance,
        destroy_instance,
        find_property,
        is_property_readable,
        is_property_writable,
        property_count,
        property_name,
        get_property,
        set_property,
        method_count,
        find_method,
        method_name,
        has_return_value,
        parameter_count,
        has_default_value,
        get_default_value,
        call_procedure,
        call_function,
    }
}

// ============================================================================
// Host-side callbacks
// ============================================================================

unsafe extern "C" fn ignore_error(_: *mut c_void, _: u16, _: WStr, _: WStr, _: i32) {}

unsafe extern "C" fn ignore_event(_: *mut c_void, _: WStr, _: WStr, _: WStr) {}

unsafe extern "C" fn record_status(user_data: *mut c_void, text: WStr) {
    let log = &*(user_data as *const Mutex<Vec<String>>);
    log.lock().push(text.to_string_lossy());
}

fn table(log: &Mutex<Vec<String>>) -> CallbackTable {
    CallbackTable {
        user_data: log as *const Mutex<Vec<String>> as *mut c_void,
        on_error: ignore_error,
        on_event: ignore_event,
        on_status: record_status,
    }
}

fn read_variant(f: impl FnOnce(&mut dyn FnMut(&Variant)) -> bool) -> Option<String> {
    let mut out = None;
    let ok = f(&mut |v: &Variant| {
        out = Some(match unsafe { v.view() } {
            Ok(VariantView::WStr(units)) => String::from_utf16_lossy(units),
            Ok(VariantView::I4(i)) => i.to_string(),
            other => format!("{:?}", other),
        });
    });
    if ok {
        out
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_unknown_component_is_refused() {
    let surface = ProxyApi::from_fns(counter_fns());
    let log = Mutex::new(Vec::new());
    assert!(surface.create_instance("Printer", &table(&log)).is_none());
    assert!(surface.library().is_none());
}

#[test]
fn test_property_round_trip_through_c_abi() {
    let surface = ProxyApi::from_fns(counter_fns());
    let log = Mutex::new(Vec::new());
    let handle = surface.create_instance("Counter", &table(&log)).unwrap();

    assert_eq!(surface.find_property(handle, "Count"), 0);
    assert_eq!(surface.find_property(handle, "Missing"), -1);
    assert_eq!(surface.property_count(handle), 1);
    assert_eq!(surface.property_name(handle, 0, false), "Count");
    assert_eq!(surface.property_name(handle, 0, true), "Counter");
    assert!(surface.is_property_readable(handle, 0));
    assert!(surface.is_property_writable(handle, 0));

    let mut value = VariantBuffer::new(1);
    value.set_i4(0, 41).unwrap();
    assert!(surface.set_property(handle, 0, value.get(0).unwrap()));

    let read = read_variant(|sink| surface.get_property(handle, 0, sink));
    assert_eq!(read.as_deref(), Some("41"));

    assert!(surface.destroy_instance(handle));
}

#[test]
fn test_function_call_and_default_value() {
    let surface = ProxyApi::from_fns(counter_fns());
    let log = Mutex::new(Vec::new());
    let handle = surface.create_instance("Counter", &table(&log)).unwrap();

    let greet = surface.find_method(handle, "Greet");
    assert_eq!(greet, 0);
    assert!(surface.has_return_value(handle, greet));
    assert_eq!(surface.parameter_count(handle, greet), 2);
    assert!(!surface.has_default_value(handle, greet, 0));
    assert!(surface.has_default_value(handle, greet, 1));

    let default = read_variant(|sink| surface.get_default_value(handle, greet, 1, sink));
    assert_eq!(default.as_deref(), Some("!"));

    let mut args = VariantBuffer::new(2);
    args.set_str(0, "World").unwrap();
    args.set_str(1, "?").unwrap();
    let result = read_variant(|sink| surface.call_function(handle, greet, &mut args, sink));
    assert_eq!(result.as_deref(), Some("Hello, World?"));

    assert!(surface.destroy_instance(handle));
}

#[test]
fn test_procedure_fires_status_callback() {
    let surface = ProxyApi::from_fns(counter_fns());
    let log = Mutex::new(Vec::new());
    let handle = surface.create_instance("Counter", &table(&log)).unwrap();

    let reset = surface.find_method(handle, "Reset");
    assert_eq!(surface.method_name(handle, reset, false), "Reset");
    assert!(!surface.has_return_value(handle, reset));

    let mut args = VariantBuffer::new(0);
    assert!(surface.call_procedure(handle, reset, &mut args));
    assert_eq!(log.lock().as_slice(), ["reset".to_string()]);

    // Procedure index used as a function is rejected by the component
    let mut args = VariantBuffer::new(0);
    assert!(read_variant(|sink| surface.call_function(handle, reset, &mut args, sink)).is_none());

    assert!(surface.destroy_instance(handle));
}
