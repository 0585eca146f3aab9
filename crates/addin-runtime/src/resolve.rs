//! Name resolution against the component's native index tables
//!
//! Every lookup goes to the native side. Nothing is cached: the native
//! tables are the only authority on which names exist and what index they
//! map to.

use addin_abi::{NativeSurface, RawHandle};
use serde::Serialize;

use crate::error::{AddinError, AddinResult};

/// Property as reported by the native side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    /// Native index
    pub index: usize,
    /// Primary name
    pub name: String,
    /// Secondary name
    pub alias: String,
    /// Whether `get` is allowed
    pub readable: bool,
    /// Whether `set` is allowed
    pub writable: bool,
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    /// Zero-based position
    pub index: usize,
    /// Whether the native side supplies a value when the argument is omitted
    pub has_default_value: bool,
}

/// Method as reported by the native side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    /// Native index
    pub index: usize,
    /// Primary name
    pub name: String,
    /// Secondary name
    pub alias: String,
    /// Whether the method returns a value
    pub is_function: bool,
    /// Declared parameters in order
    pub parameters: Vec<ParameterDescriptor>,
}

impl MethodDescriptor {
    /// Declared parameter count
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Smallest argument count a caller may supply: everything after it has
    /// a native default.
    pub fn min_arguments(&self) -> usize {
        self.parameters
            .iter()
            .rposition(|p| !p.has_default_value)
            .map_or(0, |last_required| last_required + 1)
    }
}

/// View of one instance's native tables for the duration of an operation
pub struct NameTable<'a> {
    surface: &'a dyn NativeSurface,
    handle: RawHandle,
}

fn not_found_name(index: usize) -> String {
    format!("#{}", index)
}

impl<'a> NameTable<'a> {
    /// Bind to a live instance
    pub fn new(surface: &'a dyn NativeSurface, handle: RawHandle) -> Self {
        Self { surface, handle }
    }

    /// Resolve a property name to its index
    pub fn find_property(&self, name: &str) -> AddinResult<usize> {
        let index = self.surface.find_property(self.handle, name);
        tracing::trace!(name, index, "find_property");
        usize::try_from(index).map_err(|_| AddinError::PropertyNotFound {
            name: name.to_string(),
        })
    }

    /// Resolve a method name to its index
    pub fn find_method(&self, name: &str) -> AddinResult<usize> {
        let index = self.surface.find_method(self.handle, name);
        tracing::trace!(name, index, "find_method");
        usize::try_from(index).map_err(|_| AddinError::MethodNotFound {
            name: name.to_string(),
        })
    }

    /// Number of properties
    pub fn property_count(&self) -> usize {
        self.surface.property_count(self.handle).max(0) as usize
    }

    /// Number of methods
    pub fn method_count(&self) -> usize {
        self.surface.method_count(self.handle).max(0) as usize
    }

    /// Validate a property index and convert it to the native form
    pub fn property_slot(&self, index: usize) -> AddinResult<i32> {
        match i32::try_from(index) {
            Ok(slot) if index < self.property_count() => Ok(slot),
            _ => Err(AddinError::PropertyNotFound {
                name: not_found_name(index),
            }),
        }
    }

    /// Validate a method index and convert it to the native form
    pub fn method_slot(&self, index: usize) -> AddinResult<i32> {
        match i32::try_from(index) {
            Ok(slot) if index < self.method_count() => Ok(slot),
            _ => Err(AddinError::MethodNotFound {
                name: not_found_name(index),
            }),
        }
    }

    /// Primary name of a property
    pub fn property_name(&self, index: usize) -> AddinResult<String> {
        let slot = self.property_slot(index)?;
        Ok(self.surface.property_name(self.handle, slot, false))
    }

    /// Primary name of a method
    pub fn method_name(&self, index: usize) -> AddinResult<String> {
        let slot = self.method_slot(index)?;
        Ok(self.surface.method_name(self.handle, slot, false))
    }

    /// Declared parameter count of a method
    pub fn parameter_count(&self, method: usize) -> AddinResult<usize> {
        let slot = self.method_slot(method)?;
        Ok(self.surface.parameter_count(self.handle, slot).max(0) as usize)
    }

    /// Full descriptor of one property
    pub fn property(&self, index: usize) -> AddinResult<PropertyDescriptor> {
        let slot = self.property_slot(index)?;
        Ok(PropertyDescriptor {
            index,
            name: self.surface.property_name(self.handle, slot, false),
            alias: self.surface.property_name(self.handle, slot, true),
            readable: self.surface.is_property_readable(self.handle, slot),
            writable: self.surface.is_property_writable(self.handle, slot),
        })
    }

    /// Full descriptor of one method
    pub fn method(&self, index: usize) -> AddinResult<MethodDescriptor> {
        let slot = self.method_slot(index)?;
        let param_count = self.surface.parameter_count(self.handle, slot).max(0);
        let parameters = (0..param_count)
            .map(|param| ParameterDescriptor {
                index: param as usize,
                has_default_value: self.surface.has_default_value(self.handle, slot, param),
            })
            .collect();

        Ok(MethodDescriptor {
            index,
            name: self.surface.method_name(self.handle, slot, false),
            alias: self.surface.method_name(self.handle, slot, true),
            is_function: self.surface.has_return_value(self.handle, slot),
            parameters,
        })
    }

    /// Enumerate every property, in index order
    pub fn list_properties(&self) -> AddinResult<Vec<PropertyDescriptor>> {
        (0..self.property_count()).map(|i| self.property(i)).collect()
    }

    /// Enumerate every method, in index order
    pub fn list_methods(&self) -> AddinResult<Vec<MethodDescriptor>> {
        (0..self.method_count()).map(|i| self.method(i)).collect()
    }
}
