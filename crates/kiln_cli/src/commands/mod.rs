//! CLI command definitions.
//!
//! Each subcommand maps to one entry point of the resolution engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;

use kiln_config::PlatformSettings;
use kiln_engine::Manifest;

pub mod resolve;
pub mod types;
pub mod validate;

/// Kiln - configuration resolution and capability binding for service manifests
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version, about = "Kiln - configuration resolution and capability binding")]
#[command(long_about = r#"
Kiln resolves a service manifest into fully merged component configurations
and wires components together through typed capability contracts.

COMMANDS:
  resolve   → Resolve, synthesize and bind every component in a manifest
  validate  → Check a manifest without provisioning anything
  types     → List component types and binder strategies

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Binding error
  5 - Provisioning error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a manifest and print the resolved components
    Resolve(resolve::ResolveArgs),

    /// Validate a manifest without provisioning
    Validate(validate::ValidateArgs),

    /// List registered component types and binder strategies
    Types(types::TypesArgs),
}

/// Output format for machine-readable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Load the manifest and, when given, the platform settings.
pub fn load_inputs(manifest: &Path, settings: Option<&Path>) -> Result<(Manifest, PlatformSettings)> {
    let loaded = Manifest::from_file(manifest)
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;

    let settings = match settings {
        Some(path) => PlatformSettings::from_file(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => {
            debug!("No settings file given, using platform defaults");
            PlatformSettings::default()
        }
    };
    Ok((loaded, settings))
}

/// Write to `output` when given, stdout otherwise.
pub fn emit(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
