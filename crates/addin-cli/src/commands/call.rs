//! `addin call` - invoke one method.

use std::path::Path;

use addin_runtime::{AddinResult, Argument, Component};

pub fn execute(
    library: &Path,
    component: &str,
    method: &str,
    raw_args: &[String],
) -> anyhow::Result<()> {
    let instance = super::open_component(library, component, None)?;
    let args: Vec<Argument> = raw_args.iter().map(|a| super::parse_argument(a)).collect();
    let result = invoke(&instance, method, &args);
    super::finish(instance, result)
}

fn invoke(instance: &Component, method: &str, args: &[Argument]) -> AddinResult<()> {
    let index = instance.find_method(method)?;
    if instance.method_info(index)?.is_function {
        let result = instance.call_function_at(index, args)?;
        println!("{} => {} ({})", method, result, result.type_name());
    } else {
        instance.call_procedure_at(index, args)?;
        println!("{} => ok", method);
    }
    Ok(())
}
