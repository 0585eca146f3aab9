//! `addin get` - read one property.

use std::path::Path;

pub fn execute(library: &Path, component: &str, property: &str) -> anyhow::Result<()> {
    let instance = super::open_component(library, component, None)?;
    let result = instance.get(property).map(|value| {
        println!("{} = {} ({})", property, value, value.type_name());
    });
    super::finish(instance, result)
}
