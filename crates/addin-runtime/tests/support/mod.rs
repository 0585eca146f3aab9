//! Scripted in-memory component used by the integration tests.
//!
//! `MockSurface` implements `NativeSurface` directly: a fixed property and
//! method table, per-instance property values, and method bodies that can
//! fire the registered callbacks the way a native component would.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

use addin_abi::{
    encode_wide, CallbackTable, NativeSurface, RawHandle, Variant, VariantBuffer, WStr,
};
use addin_runtime::{marshal, Component, ComponentOptions, DynValue, TypeDescriptor};
use parking_lot::Mutex;

// ============================================================================
// Table entries
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockProperty {
    pub name: String,
    pub alias: String,
    pub readable: bool,
    pub writable: bool,
    pub value: DynValue,
}

impl MockProperty {
    pub fn new(name: &str, alias: &str, value: DynValue) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
            readable: true,
            writable: true,
            value,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}

/// Method body: `None` reports a native failure
pub type MethodBody =
    Arc<dyn Fn(&mut CallContext<'_>, &[DynValue]) -> Option<DynValue> + Send + Sync>;

#[derive(Clone)]
pub struct MockMethod {
    pub name: String,
    pub alias: String,
    pub defaults: Vec<Option<DynValue>>,
    pub is_function: bool,
    pub body: MethodBody,
}

impl MockMethod {
    pub fn procedure(name: &str, alias: &str, params: usize) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
            defaults: vec![None; params],
            is_function: false,
            body: Arc::new(|_: &mut CallContext<'_>, _: &[DynValue]| Some(DynValue::Undefined)),
        }
    }

    pub fn function(name: &str, alias: &str, params: usize) -> Self {
        Self {
            is_function: true,
            ..Self::procedure(name, alias, params)
        }
    }

    pub fn with_default(mut self, param: usize, value: DynValue) -> Self {
        self.defaults[param] = Some(value);
        self
    }

    pub fn with_body(
        mut self,
        body: impl Fn(&mut CallContext<'_>, &[DynValue]) -> Option<DynValue> + Send + Sync + 'static,
    ) -> Self {
        self.body = Arc::new(body);
        self
    }
}

/// What a method body can touch
pub struct CallContext<'a> {
    pub properties: &'a mut Vec<MockProperty>,
    pub callbacks: CallbackTable,
}

impl CallContext<'_> {
    pub fn property_mut(&mut self, name: &str) -> Option<&mut MockProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    pub fn fire_error(&self, code: u16, source: &str, description: &str, extra: i32) {
        fire_error(&self.callbacks, code, source, description, extra);
    }

    pub fn fire_event(&self, source: &str, message: &str, data: &str) {
        fire_event(&self.callbacks, source, message, data);
    }

    pub fn fire_status(&self, text: &str) {
        fire_status(&self.callbacks, text);
    }
}

pub fn fire_error(table: &CallbackTable, code: u16, source: &str, description: &str, extra: i32) {
    let source = encode_wide(source);
    let description = encode_wide(description);
    unsafe {
        (table.on_error)(
            table.user_data,
            code,
            WStr::new(&source),
            WStr::new(&description),
            extra,
        )
    };
}

pub fn fire_event(table: &CallbackTable, source: &str, message: &str, data: &str) {
    let source = encode_wide(source);
    let message = encode_wide(message);
    let data = encode_wide(data);
    unsafe {
        (table.on_event)(
            table.user_data,
            WStr::new(&source),
            WStr::new(&message),
            WStr::new(&data),
        )
    };
}

pub fn fire_status(table: &CallbackTable, text: &str) {
    let text = encode_wide(text);
    unsafe { (table.on_status)(table.user_data, WStr::new(&text)) };
}

// ============================================================================
// MockSurface
// ============================================================================

/// How `destroy_instance` behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyBehavior {
    Succeed,
    ReportFailure,
    Panic,
}

/// One native call as the component saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<DynValue>,
}

struct Instance {
    properties: Vec<MockProperty>,
    callbacks: CallbackTable,
}

#[derive(Default)]
struct State {
    instances: HashMap<usize, Instance>,
    next_id: usize,
    created: usize,
    destroyed: usize,
    calls: Vec<RecordedCall>,
}

pub struct MockSurface {
    component: String,
    properties: Vec<MockProperty>,
    methods: Vec<MockMethod>,
    destroy: DestroyBehavior,
    status_on_destroy: Option<String>,
    state: Mutex<State>,
}

impl MockSurface {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            properties: Vec::new(),
            methods: Vec::new(),
            destroy: DestroyBehavior::Succeed,
            status_on_destroy: None,
            state: Mutex::new(State::default()),
        }
    }

    pub fn property(mut self, property: MockProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn method(mut self, method: MockMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn on_destroy(mut self, behavior: DestroyBehavior) -> Self {
        self.destroy = behavior;
        self
    }

    /// Fire a status callback from inside `destroy_instance`
    pub fn status_on_destroy(mut self, text: &str) -> Self {
        self.status_on_destroy = Some(text.to_string());
        self
    }

    pub fn created(&self) -> usize {
        self.state.lock().created
    }

    pub fn destroyed(&self) -> usize {
        self.state.lock().destroyed
    }

    pub fn live_instances(&self) -> usize {
        self.state.lock().instances.len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Current value of a property in the only live instance
    pub fn stored_value(&self, name: &str) -> Option<DynValue> {
        let state = self.state.lock();
        let instance = state.instances.values().next()?;
        instance
            .properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
    }

    fn id(handle: RawHandle) -> usize {
        handle.as_ptr() as usize
    }

    fn method_at(&self, index: i32) -> Option<&MockMethod> {
        usize::try_from(index).ok().and_then(|i| self.methods.get(i))
    }

    fn lookup(names: impl Iterator<Item = (String, String)>, name: &str) -> i32 {
        let lower = name.to_lowercase();
        names
            .enumerate()
            .find(|(_, (n, a))| n.to_lowercase() == lower || a.to_lowercase() == lower)
            .map_or(-1, |(i, _)| i as i32)
    }

    fn invoke(&self, handle: RawHandle, method: i32, args: &mut VariantBuffer) -> Option<DynValue> {
        let method = self.method_at(method)?.clone();
        let values: Vec<DynValue> = args
            .as_slice()
            .iter()
            .map(|v| marshal::from_native(v).unwrap())
            .collect();

        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            method: method.name.clone(),
            args: values.clone(),
        });
        let instance = state.instances.get_mut(&Self::id(handle))?;
        let mut ctx = CallContext {
            properties: &mut instance.properties,
            callbacks: instance.callbacks,
        };
        (method.body)(&mut ctx, &values)
    }
}

fn emit(value: &DynValue, sink: &mut dyn FnMut(&Variant)) {
    let buffer = marshal::to_native_value(value).unwrap();
    sink(&buffer.as_slice()[0]);
}

impl NativeSurface for MockSurface {
    fn create_instance(&self, component: &str, callbacks: &CallbackTable) -> Option<RawHandle> {
        if component != self.component {
            return None;
        }
        let mut state = self.state.lock();
        state.next_id += 1;
        state.created += 1;
        let id = state.next_id;
        state.instances.insert(
            id,
            Instance {
                properties: self.properties.clone(),
                callbacks: *callbacks,
            },
        );
        Some(RawHandle::from_ptr(id as *mut c_void))
    }

    fn destroy_instance(&self, handle: RawHandle) -> bool {
        let mut state = self.state.lock();
        let Some(instance) = state.instances.remove(&Self::id(handle)) else {
            return false;
        };
        state.destroyed += 1;
        drop(state);

        if let Some(text) = &self.status_on_destroy {
            fire_status(&instance.callbacks, text);
        }
        match self.destroy {
            DestroyBehavior::Succeed => true,
            DestroyBehavior::ReportFailure => false,
            DestroyBehavior::Panic => panic!("native destroy blew up"),
        }
    }

    fn find_property(&self, _handle: RawHandle, name: &str) -> i32 {
        Self::lookup(
            self.properties.iter().map(|p| (p.name.clone(), p.alias.clone())),
            name,
        )
    }

    fn is_property_readable(&self, _handle: RawHandle, index: i32) -> bool {
        self.properties.get(index as usize).is_some_and(|p| p.readable)
    }

    fn is_property_writable(&self, _handle: RawHandle, index: i32) -> bool {
        self.properties.get(index as usize).is_some_and(|p| p.writable)
    }

    fn property_count(&self, _handle: RawHandle) -> i32 {
        self.properties.len() as i32
    }

    fn property_name(&self, _handle: RawHandle, index: i32, alias: bool) -> String {
        match self.properties.get(index as usize) {
            Some(p) if alias => p.alias.clone(),
            Some(p) => p.name.clone(),
            None => String::new(),
        }
    }

    fn get_property(&self, handle: RawHandle, index: i32, sink: &mut dyn FnMut(&Variant)) -> bool {
        let value = {
            let state = self.state.lock();
            let Some(instance) = state.instances.get(&Self::id(handle)) else {
                return false;
            };
            match instance.properties.get(index as usize) {
                Some(p) => p.value.clone(),
                None => return false,
            }
        };
        emit(&value, sink);
        true
    }

    fn set_property(&self, handle: RawHandle, index: i32, value: &Variant) -> bool {
        let value = marshal::from_native(value).unwrap();
        let mut state = self.state.lock();
        let Some(instance) = state.instances.get_mut(&Self::id(handle)) else {
            return false;
        };
        match instance.properties.get_mut(index as usize) {
            Some(p) => {
                p.value = value;
                true
            }
            None => false,
        }
    }

    fn method_count(&self, _handle: RawHandle) -> i32 {
        self.methods.len() as i32
    }

    fn find_method(&self, _handle: RawHandle, name: &str) -> i32 {
        Self::lookup(
            self.methods.iter().map(|m| (m.name.clone(), m.alias.clone())),
            name,
        )
    }

    fn method_name(&self, _handle: RawHandle, index: i32, alias: bool) -> String {
        match self.method_at(index) {
            Some(m) if alias => m.alias.clone(),
            Some(m) => m.name.clone(),
            None => String::new(),
        }
    }

    fn has_return_value(&self, _handle: RawHandle, index: i32) -> bool {
        self.method_at(index).is_some_and(|m| m.is_function)
    }

    fn parameter_count(&self, _handle: RawHandle, index: i32) -> i32 {
        self.method_at(index).map_or(0, |m| m.defaults.len() as i32)
    }

    fn has_default_value(&self, _handle: RawHandle, method: i32, param: i32) -> bool {
        self.method_at(method)
            .and_then(|m| m.defaults.get(param as usize))
            .is_some_and(|d| d.is_some())
    }

    fn get_default_value(
        &self,
        _handle: RawHandle,
        method: i32,
        param: i32,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool {
        match self
            .method_at(method)
            .and_then(|m| m.defaults.get(param as usize))
        {
            Some(Some(value)) => {
                emit(value, sink);
                true
            }
            _ => false,
        }
    }

    fn call_procedure(&self, handle: RawHandle, method: i32, args: &mut VariantBuffer) -> bool {
        self.invoke(handle, method, args).is_some()
    }

    fn call_function(
        &self,
        handle: RawHandle,
        method: i32,
        args: &mut VariantBuffer,
        sink: &mut dyn FnMut(&Variant),
    ) -> bool {
        match self.invoke(handle, method, args) {
            Some(value) => {
                emit(&value, sink);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A receipt printer component
///
/// Properties: `Title`/`Заголовок` (rw), `Version` (read-only),
/// `Password` (write-only).
///
/// Methods: `Connect(host, timeout = 5000) -> bool`, `Print(text)` (fires an
/// event), `Reset()` (fires a status), `Alert(code, text)` (fires an error),
/// `Jam()` (native failure), `Beep(times = 1, volume)`.
pub fn receipt_printer() -> MockSurface {
    MockSurface::new("Receipt")
        .property(MockProperty::new("Title", "Заголовок", DynValue::from("")))
        .property(MockProperty::new("Version", "Версия", DynValue::from("1.0")).read_only())
        .property(MockProperty::new("Password", "Пароль", DynValue::Undefined).write_only())
        .method(
            MockMethod::function("Connect", "Подключить", 2)
                .with_default(1, DynValue::from(5000))
                .with_body(|_, args| Some(DynValue::Bool(args[0].as_str() == Some("host")))),
        )
        .method(
            MockMethod::procedure("Print", "Печать", 1).with_body(|ctx, args| {
                let text = args[0].to_string();
                ctx.fire_event("Receipt", "Printed", &text);
                Some(DynValue::Undefined)
            }),
        )
        .method(MockMethod::procedure("Reset", "Сброс", 0).with_body(|ctx, _| {
            if let Some(title) = ctx.property_mut("Title") {
                title.value = DynValue::from("");
            }
            ctx.fire_status("reset");
            Some(DynValue::Undefined)
        }))
        .method(
            MockMethod::procedure("Alert", "Тревога", 2).with_body(|ctx, args| {
                let code = args[0].as_number().unwrap_or(0.0) as u16;
                ctx.fire_error(code, "Receipt", &args[1].to_string(), 7);
                Some(DynValue::Undefined)
            }),
        )
        .method(MockMethod::procedure("Jam", "Замять", 0).with_body(|_, _| None))
        .method(
            MockMethod::function("Beep", "Сигнал", 2)
                .with_default(0, DynValue::from(1))
                .with_body(|_, args| Some(args[0].clone())),
        )
}

/// `AddIn.Printer.Receipt` over `surface`
pub fn create(surface: &Arc<MockSurface>) -> Component {
    create_with(surface, &ComponentOptions::default())
}

pub fn create_with(surface: &Arc<MockSurface>, options: &ComponentOptions) -> Component {
    Component::create(
        surface.clone(),
        TypeDescriptor::new("Printer", "Receipt"),
        options,
    )
    .unwrap()
}
