//! `addin` - inspect and drive native add-in components from the shell
//!
//! Loads a component library, creates an instance and performs one
//! operation on it. Native notifications raised along the way are
//! delivered and printed before the instance is disposed.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "addin")]
#[command(about = "Native add-in component toolkit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a component's properties and methods
    Inspect {
        /// Shared library exporting the component
        library: PathBuf,
        /// Component name inside the library
        component: String,
        /// Library name used in the type name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read a property
    Get {
        /// Shared library exporting the component
        library: PathBuf,
        /// Component name inside the library
        component: String,
        /// Property name or alias
        property: String,
    },

    /// Call a method
    ///
    /// Arguments: `_` leaves the position to the native default, `true` /
    /// `false` and numbers are passed as such, anything else as a string.
    Call {
        /// Shared library exporting the component
        library: PathBuf,
        /// Component name inside the library
        component: String,
        /// Method name or alias
        method: String,
        /// Positional arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Validate an add-in configuration file
    Check {
        /// Path to addins.toml
        config: PathBuf,
        /// Also load every library and create every listed component
        #[arg(long)]
        load: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ADDIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            library,
            component,
            name,
            json,
        } => commands::inspect::execute(&library, &component, name, json),

        Commands::Get {
            library,
            component,
            property,
        } => commands::get::execute(&library, &component, &property),

        Commands::Call {
            library,
            component,
            method,
            args,
        } => commands::call::execute(&library, &component, &method, &args),

        Commands::Check { config, load } => commands::check::execute(&config, load),
    }
}
