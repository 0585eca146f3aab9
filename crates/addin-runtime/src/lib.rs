//! Add-in runtime - native components as dynamic script objects
//!
//! A native add-in exposes a handle-based, numerically indexed surface.
//! This crate turns it into an object the script runtime can treat like any
//! other: members resolved by name at run time, values marshalled to and
//! from native variants, omitted arguments filled from native defaults, and
//! native callbacks delivered as notifications at the host's dispatch point.
//!
//! - `marshal` - `DynValue` <-> `Variant`
//! - `resolve` - name/index lookups against the native tables
//! - `callbacks` - native callbacks into a queue, then to subscribers
//! - `component` - the `Component` facade and its lifecycle
//! - `object` - the `DynamicObject` capability set
//!
//! # Example
//!
//! ```ignore
//! use addin_runtime::{AddinLibrary, Argument, ComponentOptions, DynValue};
//!
//! let library = AddinLibrary::open("Printer", "./libprinter.so")?;
//! let mut receipt = library.create_component("Receipt", &ComponentOptions::default())?;
//!
//! receipt.subscribe_event(|event| println!("{}: {}", event.source, event.message))?;
//! receipt.set("Title", &DynValue::from("Sale #41"))?;
//! receipt.call_function("Connect", &[DynValue::from("host").into(), Argument::UseDefault])?;
//! receipt.dispatch_pending()?;
//! receipt.dispose();
//! ```

pub mod callbacks;
pub mod component;
pub mod config;
pub mod error;
pub mod library;
pub mod marshal;
pub mod object;
pub mod resolve;
pub mod value;

pub use callbacks::{
    CallbackBridge, CallbackRegistration, ErrorCode, ErrorNotice, EventNotice, Notification,
    Severity, SubscriptionId, Subscribers,
};
pub use component::{Component, ComponentOptions, ComponentState, TypeDescriptor};
pub use config::{AddinConfig, AddinEntry, CallbackConfig, ConfigError};
pub use error::{AddinError, AddinResult};
pub use library::AddinLibrary;
pub use object::DynamicObject;
pub use resolve::{MethodDescriptor, NameTable, ParameterDescriptor, PropertyDescriptor};
pub use value::{Argument, DynValue, ObjectRef};
