//! `addin check` - validate an add-in configuration.

use std::path::Path;

use addin_runtime::AddinConfig;

pub fn execute(path: &Path, load: bool) -> anyhow::Result<()> {
    let config = AddinConfig::from_file(path)?;
    let options = config.component_options();

    println!("{}: {} add-in(s)", path.display(), config.addins.len());
    match options.callback_capacity {
        Some(cap) => println!("Callback queue: bounded ({})", cap),
        None => println!("Callback queue: unbounded"),
    }

    let mut failures = 0;
    for entry in &config.addins {
        println!();
        println!("{}  {}", entry.name, entry.path.display());
        if !load {
            for component in &entry.components {
                println!("  AddIn.{}.{}", entry.name, component);
            }
            continue;
        }

        let library = match entry.open() {
            Ok(library) => library,
            Err(e) => {
                println!("  load failed: {}", e);
                failures += 1;
                continue;
            }
        };
        for component in &entry.components {
            match library.create_component(component, &options) {
                Ok(mut instance) => {
                    let props = instance.property_count()?;
                    let methods = instance.method_count()?;
                    println!(
                        "  {}  {} properties, {} methods",
                        instance.type_name(),
                        props,
                        methods
                    );
                    instance.dispose();
                }
                Err(e) => {
                    println!("  AddIn.{}.{}  {}", entry.name, component, e);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} add-in check(s) failed", failures);
    }
    Ok(())
}
