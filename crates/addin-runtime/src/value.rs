//! Host dynamic values
//!
//! `DynValue` is the script runtime's tagged value as seen by the adapter.
//! `Argument` describes one positional argument slot of a method call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque host object (script class instance, collection, another component).
///
/// Identity-compared. Has no native representation.
#[derive(Clone)]
pub struct ObjectRef {
    type_name: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a host object under a script-visible type name
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, object: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner: Arc::new(object),
        }
    }

    /// Script-visible type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the wrapped object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.type_name)
    }
}

/// Tagged dynamic value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynValue {
    /// No value assigned
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number (integers and fractions share one kind)
    Number(f64),
    /// String
    String(String),
    /// Milliseconds since the Unix epoch
    Date(i64),
    /// Binary data
    Binary(Vec<u8>),
    /// Host object reference
    Object(ObjectRef),
}

impl DynValue {
    /// Kind name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            DynValue::Undefined => "Undefined",
            DynValue::Null => "Null",
            DynValue::Bool(_) => "Boolean",
            DynValue::Number(_) => "Number",
            DynValue::String(_) => "String",
            DynValue::Date(_) => "Date",
            DynValue::Binary(_) => "BinaryData",
            DynValue::Object(_) => "Object",
        }
    }

    /// Check for `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, DynValue::Undefined)
    }

    /// Get as bool if this is a Boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as f64 if this is a Number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DynValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as epoch milliseconds if this is a Date
    pub fn as_date(&self) -> Option<i64> {
        match self {
            DynValue::Date(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl fmt::Display for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynValue::Undefined => Ok(()),
            DynValue::Null => write!(f, "null"),
            DynValue::Bool(b) => write!(f, "{}", b),
            DynValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            DynValue::Number(n) => write!(f, "{}", n),
            DynValue::String(s) => write!(f, "{}", s),
            DynValue::Date(ms) => write!(f, "Date({})", ms),
            DynValue::Binary(bytes) => write!(f, "BinaryData({} bytes)", bytes.len()),
            DynValue::Object(obj) => write!(f, "{}", obj.type_name()),
        }
    }
}

impl From<bool> for DynValue {
    fn from(b: bool) -> Self {
        DynValue::Bool(b)
    }
}

impl From<i32> for DynValue {
    fn from(i: i32) -> Self {
        DynValue::Number(i as f64)
    }
}

impl From<f64> for DynValue {
    fn from(f: f64) -> Self {
        DynValue::Number(f)
    }
}

impl From<&str> for DynValue {
    fn from(s: &str) -> Self {
        DynValue::String(s.to_string())
    }
}

impl From<String> for DynValue {
    fn from(s: String) -> Self {
        DynValue::String(s)
    }
}

impl From<Vec<u8>> for DynValue {
    fn from(bytes: Vec<u8>) -> Self {
        DynValue::Binary(bytes)
    }
}

/// One positional argument slot of a method call
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Caller supplied a value
    Provided(DynValue),
    /// Caller left the position empty; use the native default
    UseDefault,
}

impl Argument {
    /// The supplied value, if any
    pub fn value(&self) -> Option<&DynValue> {
        match self {
            Argument::Provided(v) => Some(v),
            Argument::UseDefault => None,
        }
    }
}

impl From<DynValue> for Argument {
    fn from(value: DynValue) -> Self {
        Argument::Provided(value)
    }
}
