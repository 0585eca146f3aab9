//! Component instance: the dynamic-object facade over one native handle
//!
//! A `Component` owns its native handle exclusively. It resolves names
//! against the native tables on every call, marshals values both ways,
//! substitutes native defaults for omitted arguments and owns the callback
//! registration. Teardown is explicit (`dispose`) or on drop, and happens
//! once.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use addin_abi::{NativeSurface, RawHandle, Variant, VariantBuffer};

use crate::callbacks::{
    CallbackBridge, CallbackRegistration, ErrorNotice, EventNotice, SubscriptionId,
};
use crate::error::{AddinError, AddinResult};
use crate::marshal;
use crate::resolve::{MethodDescriptor, NameTable, PropertyDescriptor};
use crate::value::{Argument, DynValue};

/// Per-instance settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Bound on queued notifications; `None` = unbounded, `Some(0)` acts as 1
    pub callback_capacity: Option<usize>,
}

/// Which component of which library an instance is
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Library name as registered with the host
    pub library: String,
    /// Component name inside the library
    pub component: String,
}

impl TypeDescriptor {
    pub fn new(library: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            component: component.into(),
        }
    }

    /// Script-visible type name, `AddIn.<library>.<component>`
    pub fn type_name(&self) -> String {
        format!("AddIn.{}.{}", self.library, self.component)
    }
}

/// Lifecycle state.
///
/// `state()` only reports `Live` or `Disposed`: a failed construction
/// returns an error instead of an `Uninitialized` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Native construction has not completed
    Uninitialized,
    /// Holding a native handle
    Live,
    /// Handle released; only `dispose` is valid
    Disposed,
}

enum Lifecycle {
    Live {
        handle: RawHandle,
        registration: CallbackRegistration,
    },
    Disposed,
}

/// A native component instance seen as a dynamic object
pub struct Component {
    surface: Arc<dyn NativeSurface>,
    descriptor: TypeDescriptor,
    type_name: String,
    lifecycle: Lifecycle,
    bridge: CallbackBridge,
}

impl Component {
    /// Create a native instance and register the callback channels.
    ///
    /// Fails with `CreateFailed` when the native side refuses; no instance
    /// is returned in that case.
    pub fn create(
        surface: Arc<dyn NativeSurface>,
        descriptor: TypeDescriptor,
        options: &ComponentOptions,
    ) -> AddinResult<Self> {
        let (registration, queue) = CallbackRegistration::new(options.callback_capacity);
        let table = registration.table();

        let handle = surface
            .create_instance(&descriptor.component, &table)
            .filter(|handle| !handle.is_null())
            .ok_or_else(|| AddinError::CreateFailed {
                component: descriptor.component.clone(),
            })?;

        let type_name = descriptor.type_name();
        tracing::debug!(component = %type_name, "component created");

        Ok(Self {
            surface,
            descriptor,
            type_name,
            lifecycle: Lifecycle::Live {
                handle,
                registration,
            },
            bridge: CallbackBridge::new(queue),
        })
    }

    /// `AddIn.<library>.<component>`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Current lifecycle state
    pub fn state(&self) -> ComponentState {
        match self.lifecycle {
            Lifecycle::Live { .. } => ComponentState::Live,
            Lifecycle::Disposed => ComponentState::Disposed,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Disposed)
    }

    fn handle(&self, operation: &'static str) -> AddinResult<RawHandle> {
        match &self.lifecycle {
            Lifecycle::Live { handle, .. } => Ok(*handle),
            Lifecycle::Disposed => Err(AddinError::UseAfterDispose {
                component: self.type_name.clone(),
                operation,
            }),
        }
    }

    fn names(&self, operation: &'static str) -> AddinResult<(RawHandle, NameTable<'_>)> {
        let handle = self.handle(operation)?;
        Ok((handle, NameTable::new(&*self.surface, handle)))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Resolve a property name to its index
    pub fn find_property(&self, name: &str) -> AddinResult<usize> {
        let (_, names) = self.names("find_property")?;
        names.find_property(name)
    }

    /// Number of properties
    pub fn property_count(&self) -> AddinResult<usize> {
        let (_, names) = self.names("property_count")?;
        Ok(names.property_count())
    }

    /// Read a property by name
    pub fn get(&self, name: &str) -> AddinResult<DynValue> {
        let (handle, names) = self.names("get")?;
        let index = names.find_property(name)?;
        let slot = names.property_slot(index)?;
        self.read_property(handle, slot, index, name)
    }

    /// Read a property by index
    pub fn get_at(&self, index: usize) -> AddinResult<DynValue> {
        let (handle, names) = self.names("get")?;
        let slot = names.property_slot(index)?;
        let name = names.property_name(index)?;
        self.read_property(handle, slot, index, &name)
    }

    fn read_property(
        &self,
        handle: RawHandle,
        slot: i32,
        index: usize,
        name: &str,
    ) -> AddinResult<DynValue> {
        if !self.surface.is_property_readable(handle, slot) {
            return Err(AddinError::PropertyNotReadable {
                name: name.to_string(),
                index,
            });
        }

        let mut value = Ok(DynValue::Undefined);
        tracing::trace!(property = name, index, "get_property");
        let ok = self
            .surface
            .get_property(handle, slot, &mut |v: &Variant| value = marshal::from_native(v));
        if !ok {
            return Err(AddinError::NativeCallFailed {
                operation: "get_property",
                target: name.to_string(),
            });
        }
        value
    }

    /// Write a property by name
    pub fn set(&self, name: &str, value: &DynValue) -> AddinResult<()> {
        let (handle, names) = self.names("set")?;
        let index = names.find_property(name)?;
        let slot = names.property_slot(index)?;
        self.write_property(handle, slot, index, name, value)
    }

    /// Write a property by index
    pub fn set_at(&self, index: usize, value: &DynValue) -> AddinResult<()> {
        let (handle, names) = self.names("set")?;
        let slot = names.property_slot(index)?;
        let name = names.property_name(index)?;
        self.write_property(handle, slot, index, &name, value)
    }

    fn write_property(
        &self,
        handle: RawHandle,
        slot: i32,
        index: usize,
        name: &str,
        value: &DynValue,
    ) -> AddinResult<()> {
        if !self.surface.is_property_writable(handle, slot) {
            return Err(AddinError::PropertyNotWritable {
                name: name.to_string(),
                index,
            });
        }

        let buffer = marshal::to_native_value(value)?;
        tracing::trace!(property = name, index, kind = value.type_name(), "set_property");
        if !self.surface.set_property(handle, slot, &buffer.as_slice()[0]) {
            return Err(AddinError::NativeCallFailed {
                operation: "set_property",
                target: name.to_string(),
            });
        }
        Ok(())
    }

    /// Descriptors of every property, in index order
    pub fn describe_properties(&self) -> AddinResult<Vec<PropertyDescriptor>> {
        let (_, names) = self.names("describe_properties")?;
        names.list_properties()
    }

    /// Descriptor of one property
    pub fn property_info(&self, index: usize) -> AddinResult<PropertyDescriptor> {
        let (_, names) = self.names("property_info")?;
        names.property(index)
    }

    // ========================================================================
    // Methods
    // ========================================================================

    /// Resolve a method name to its index
    pub fn find_method(&self, name: &str) -> AddinResult<usize> {
        let (_, names) = self.names("find_method")?;
        names.find_method(name)
    }

    /// Number of methods
    pub fn method_count(&self) -> AddinResult<usize> {
        let (_, names) = self.names("method_count")?;
        Ok(names.method_count())
    }

    /// Descriptors of every method, in index order
    pub fn describe_methods(&self) -> AddinResult<Vec<MethodDescriptor>> {
        let (_, names) = self.names("describe_methods")?;
        names.list_methods()
    }

    /// Descriptor of one method
    pub fn method_info(&self, index: usize) -> AddinResult<MethodDescriptor> {
        let (_, names) = self.names("method_info")?;
        names.method(index)
    }

    /// Invoke a method by name, discarding any result
    pub fn call_procedure(&self, name: &str, args: &[Argument]) -> AddinResult<()> {
        let (handle, names) = self.names("call_procedure")?;
        let index = names.find_method(name)?;
        let slot = names.method_slot(index)?;
        self.invoke_procedure(handle, slot, name, args)
    }

    /// Invoke a method by index, discarding any result
    pub fn call_procedure_at(&self, index: usize, args: &[Argument]) -> AddinResult<()> {
        let (handle, names) = self.names("call_procedure")?;
        let slot = names.method_slot(index)?;
        let name = names.method_name(index)?;
        self.invoke_procedure(handle, slot, &name, args)
    }

    /// Invoke a value-returning method by name
    pub fn call_function(&self, name: &str, args: &[Argument]) -> AddinResult<DynValue> {
        let (handle, names) = self.names("call_function")?;
        let index = names.find_method(name)?;
        let slot = names.method_slot(index)?;
        self.invoke_function(handle, slot, index, name, args)
    }

    /// Invoke a value-returning method by index
    pub fn call_function_at(&self, index: usize, args: &[Argument]) -> AddinResult<DynValue> {
        let (handle, names) = self.names("call_function")?;
        let slot = names.method_slot(index)?;
        let name = names.method_name(index)?;
        self.invoke_function(handle, slot, index, &name, args)
    }

    fn invoke_procedure(
        &self,
        handle: RawHandle,
        slot: i32,
        name: &str,
        args: &[Argument],
    ) -> AddinResult<()> {
        let mut buffer = self.prepare_arguments(handle, slot, name, args)?;
        tracing::trace!(method = name, argc = buffer.len(), "call_procedure");
        if !self.surface.call_procedure(handle, slot, &mut buffer) {
            return Err(AddinError::NativeCallFailed {
                operation: "call_procedure",
                target: name.to_string(),
            });
        }
        Ok(())
    }

    fn invoke_function(
        &self,
        handle: RawHandle,
        slot: i32,
        index: usize,
        name: &str,
        args: &[Argument],
    ) -> AddinResult<DynValue> {
        if !self.surface.has_return_value(handle, slot) {
            return Err(AddinError::NotAFunction {
                name: name.to_string(),
                index,
            });
        }

        let mut buffer = self.prepare_arguments(handle, slot, name, args)?;
        let mut result = Ok(DynValue::Undefined);
        tracing::trace!(method = name, argc = buffer.len(), "call_function");
        let ok = self.surface.call_function(
            handle,
            slot,
            &mut buffer,
            &mut |v: &Variant| result = marshal::from_native(v),
        );
        if !ok {
            return Err(AddinError::NativeCallFailed {
                operation: "call_function",
                target: name.to_string(),
            });
        }
        result
    }

    /// Build the argument buffer for one call: supplied values in order,
    /// native defaults for every `UseDefault` or missing trailing position.
    fn prepare_arguments(
        &self,
        handle: RawHandle,
        slot: i32,
        name: &str,
        args: &[Argument],
    ) -> AddinResult<VariantBuffer> {
        let declared = self.surface.parameter_count(handle, slot).max(0) as usize;
        if args.len() > declared {
            return Err(AddinError::TooManyArguments {
                method: name.to_string(),
                expected: declared,
                got: args.len(),
            });
        }

        let mut buffer = VariantBuffer::new(declared);
        for param in 0..declared {
            match args.get(param) {
                Some(Argument::Provided(value)) => marshal::to_native(value, &mut buffer, param)?,
                Some(Argument::UseDefault) | None => {
                    let value = self.default_value(handle, slot, name, param)?;
                    marshal::to_native(&value, &mut buffer, param)?;
                }
            }
        }
        Ok(buffer)
    }

    fn default_value(
        &self,
        handle: RawHandle,
        slot: i32,
        name: &str,
        param: usize,
    ) -> AddinResult<DynValue> {
        let no_default = || AddinError::NoDefaultValue {
            method: name.to_string(),
            param,
        };
        let native_param = i32::try_from(param).map_err(|_| no_default())?;
        if !self.surface.has_default_value(handle, slot, native_param) {
            return Err(no_default());
        }

        let mut value = Ok(DynValue::Undefined);
        let ok = self.surface.get_default_value(
            handle,
            slot,
            native_param,
            &mut |v: &Variant| value = marshal::from_native(v),
        );
        if !ok {
            return Err(AddinError::NativeCallFailed {
                operation: "get_default_value",
                target: name.to_string(),
            });
        }
        value
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Observe the error channel
    pub fn subscribe_error(
        &mut self,
        handler: impl FnMut(&ErrorNotice) + 'static,
    ) -> AddinResult<SubscriptionId> {
        self.handle("subscribe")?;
        Ok(self.bridge.subscribers_mut().on_error(handler))
    }

    /// Observe the event channel
    pub fn subscribe_event(
        &mut self,
        handler: impl FnMut(&EventNotice) + 'static,
    ) -> AddinResult<SubscriptionId> {
        self.handle("subscribe")?;
        Ok(self.bridge.subscribers_mut().on_event(handler))
    }

    /// Observe the status text channel
    pub fn subscribe_status(
        &mut self,
        handler: impl FnMut(&str) + 'static,
    ) -> AddinResult<SubscriptionId> {
        self.handle("subscribe")?;
        Ok(self.bridge.subscribers_mut().on_status(handler))
    }

    /// Detach a subscriber. Returns false if it was not attached.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bridge.subscribers_mut().unsubscribe(id)
    }

    /// Notifications fired by the native side and not yet delivered
    pub fn pending_notifications(&self) -> usize {
        self.bridge.pending()
    }

    /// Deliver queued notifications to subscribers. The host calls this at
    /// its dispatch point; nothing is delivered anywhere else.
    pub fn dispatch_pending(&mut self) -> AddinResult<usize> {
        self.handle("dispatch_pending")?;
        let delivered = self.bridge.dispatch_pending();
        if delivered > 0 {
            tracing::trace!(component = %self.type_name, delivered, "notifications dispatched");
        }
        Ok(delivered)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release the native handle. Idempotent; never fails.
    ///
    /// The callback slot is closed and freed only after the native side has
    /// destroyed the instance. Undelivered notifications are discarded.
    pub fn dispose(&mut self) {
        let Lifecycle::Live {
            handle,
            registration,
        } = std::mem::replace(&mut self.lifecycle, Lifecycle::Disposed)
        else {
            return;
        };

        let surface = &self.surface;
        match panic::catch_unwind(AssertUnwindSafe(|| surface.destroy_instance(handle))) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(component = %self.type_name, "native destroy reported failure");
            }
            Err(_) => {
                tracing::warn!(component = %self.type_name, "native destroy panicked");
            }
        }

        registration.close();
        drop(registration);
        let discarded = self.bridge.shutdown();
        tracing::debug!(component = %self.type_name, discarded, "component disposed");
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("type_name", &self.type_name)
            .field("state", &self.state())
            .finish()
    }
}
