//! Subcommand implementations and the helpers they share.

pub mod call;
pub mod check;
pub mod get;
pub mod inspect;

use std::path::Path;

use addin_runtime::{AddinLibrary, AddinResult, Argument, Component, ComponentOptions, DynValue};
use anyhow::Context;

/// Library name derived from a file name: `libprinter.so` -> `printer`
pub fn library_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("AddIn");
    stem.strip_prefix("lib")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem)
        .to_string()
}

/// Load `library` and create one `component` instance
pub fn open_component(
    library: &Path,
    component: &str,
    name: Option<String>,
) -> anyhow::Result<Component> {
    let name = name.unwrap_or_else(|| library_name(library));
    tracing::debug!(library = %library.display(), %name, component, "opening component");
    let library = AddinLibrary::open(name, library)
        .with_context(|| format!("loading {}", library.display()))?;
    let component = library
        .create_component(component, &ComponentOptions::default())
        .with_context(|| format!("creating component '{}'", component))?;
    Ok(component)
}

/// Print every notification the component raised, then dispose it
pub fn drain_and_dispose(mut component: Component) -> anyhow::Result<()> {
    component.subscribe_error(|e| {
        eprintln!("[error/{}] {}: {} ({})", e.severity, e.source, e.description, e.extra)
    })?;
    component.subscribe_event(|e| println!("[event] {}: {} {}", e.source, e.message, e.data))?;
    component.subscribe_status(|s| println!("[status] {}", s))?;
    let delivered = component.dispatch_pending()?;
    tracing::debug!(component = component.type_name(), delivered, "notifications printed");
    component.dispose();
    Ok(())
}

/// Print notifications and dispose whether or not the operation succeeded;
/// the operation's own error wins over a teardown error.
pub fn finish<T>(component: Component, result: AddinResult<T>) -> anyhow::Result<T> {
    settle(result, drain_and_dispose(component))
}

fn settle<T>(result: AddinResult<T>, teardown: anyhow::Result<()>) -> anyhow::Result<T> {
    let value = result?;
    teardown?;
    Ok(value)
}

/// Interpret one command-line argument
pub fn parse_argument(raw: &str) -> Argument {
    match raw {
        "_" => Argument::UseDefault,
        "true" => Argument::Provided(DynValue::Bool(true)),
        "false" => Argument::Provided(DynValue::Bool(false)),
        "null" => Argument::Provided(DynValue::Null),
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Argument::Provided(DynValue::Number(n)),
            _ => Argument::Provided(DynValue::from(raw)),
        },
    }
}
