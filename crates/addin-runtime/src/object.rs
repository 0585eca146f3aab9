//! Dynamic-object capability set the host runtime programs against

use crate::component::Component;
use crate::error::{AddinError, AddinResult};
use crate::resolve::{MethodDescriptor, PropertyDescriptor};
use crate::value::{Argument, DynValue};

/// An object whose members are only known at run time.
///
/// `get_indexed` / `set_indexed` take a string key as a property name and
/// a number key as a property index.
pub trait DynamicObject {
    /// Script-visible type name
    fn type_name(&self) -> &str;

    /// Whether `obj[key]` access is supported
    fn is_indexed(&self) -> bool;

    fn find_property(&self, name: &str) -> AddinResult<usize>;
    fn property_count(&self) -> AddinResult<usize>;
    fn property_info(&self, index: usize) -> AddinResult<PropertyDescriptor>;
    fn get_property_value(&self, index: usize) -> AddinResult<DynValue>;
    fn set_property_value(&self, index: usize, value: &DynValue) -> AddinResult<()>;

    fn find_method(&self, name: &str) -> AddinResult<usize>;
    fn method_count(&self) -> AddinResult<usize>;
    fn method_info(&self, index: usize) -> AddinResult<MethodDescriptor>;
    fn call_as_procedure(&self, index: usize, args: &[Argument]) -> AddinResult<()>;
    fn call_as_function(&self, index: usize, args: &[Argument]) -> AddinResult<DynValue>;

    /// `obj[key]`
    fn get_indexed(&self, key: &DynValue) -> AddinResult<DynValue> {
        let index = self.property_key(key)?;
        self.get_property_value(index)
    }

    /// `obj[key] = value`
    fn set_indexed(&self, key: &DynValue, value: &DynValue) -> AddinResult<()> {
        let index = self.property_key(key)?;
        self.set_property_value(index, value)
    }

    /// Resolve an index key to a property index
    fn property_key(&self, key: &DynValue) -> AddinResult<usize> {
        match key {
            DynValue::String(name) => self.find_property(name),
            DynValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= usize::MAX as f64 => {
                Ok(*n as usize)
            }
            DynValue::Number(n) => Err(AddinError::PropertyNotFound {
                name: format!("#{}", n),
            }),
            other => Err(AddinError::Marshalling {
                kind: other.type_name().to_string(),
                reason: "index key must be a String or Number".to_string(),
            }),
        }
    }
}

impl DynamicObject for Component {
    fn type_name(&self) -> &str {
        Component::type_name(self)
    }

    fn is_indexed(&self) -> bool {
        true
    }

    fn find_property(&self, name: &str) -> AddinResult<usize> {
        Component::find_property(self, name)
    }

    fn property_count(&self) -> AddinResult<usize> {
        Component::property_count(self)
    }

    fn property_info(&self, index: usize) -> AddinResult<PropertyDescriptor> {
        Component::property_info(self, index)
    }

    fn get_property_value(&self, index: usize) -> AddinResult<DynValue> {
        self.get_at(index)
    }

    fn set_property_value(&self, index: usize, value: &DynValue) -> AddinResult<()> {
        self.set_at(index, value)
    }

    fn find_method(&self, name: &str) -> AddinResult<usize> {
        Component::find_method(self, name)
    }

    fn method_count(&self) -> AddinResult<usize> {
        Component::method_count(self)
    }

    fn method_info(&self, index: usize) -> AddinResult<MethodDescriptor> {
        Component::method_info(self, index)
    }

    fn call_as_procedure(&self, index: usize, args: &[Argument]) -> AddinResult<()> {
        self.call_procedure_at(index, args)
    }

    fn call_as_function(&self, index: usize, args: &[Argument]) -> AddinResult<DynValue> {
        self.call_function_at(index, args)
    }
}
