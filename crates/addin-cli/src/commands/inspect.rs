//! `addin inspect` - dump a component's descriptor tables.

use std::path::Path;

use addin_runtime::{MethodDescriptor, PropertyDescriptor};

pub fn execute(
    library: &Path,
    component: &str,
    name: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let instance = super::open_component(library, component, name)?;
    let properties = instance.describe_properties()?;
    let methods = instance.describe_methods()?;

    if json {
        let out = serde_json::json!({
            "type": instance.type_name(),
            "properties": properties,
            "methods": methods,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", instance.type_name());
        println!();
        println!("Properties ({}):", properties.len());
        for p in &properties {
            println!("  {}", format_property(p));
        }
        println!();
        println!("Methods ({}):", methods.len());
        for m in &methods {
            println!("  {}", format_method(m));
        }
    }

    super::drain_and_dispose(instance)
}

fn format_property(p: &PropertyDescriptor) -> String {
    let access = match (p.readable, p.writable) {
        (true, true) => "rw",
        (true, false) => "r-",
        (false, true) => "-w",
        (false, false) => "--",
    };
    format!("[{}] {} / {}  {}", p.index, p.name, p.alias, access)
}

fn format_method(m: &MethodDescriptor) -> String {
    let params: Vec<String> = m
        .parameters
        .iter()
        .map(|p| {
            if p.has_default_value {
                format!("p{}?", p.index)
            } else {
                format!("p{}", p.index)
            }
        })
        .collect();
    let kind = if m.is_function { "function" } else { "procedure" };
    format!(
        "[{}] {} / {}({})  {}",
        m.index,
        m.name,
        m.alias,
        params.join(", "),
        kind
    )
}
