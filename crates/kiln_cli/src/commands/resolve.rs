//! Resolve command - Resolve, synthesize and bind a manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use kiln_components::InMemoryProvisioner;
use kiln_engine::{default_binder_registry, default_component_registry, ResolutionPipeline};

use super::{emit, load_inputs, OutputFormat};

#[derive(Args)]
pub struct ResolveArgs {
    /// Path to the service manifest
    pub manifest: PathBuf,

    /// Platform settings file
    #[arg(short, long, env = "KILN_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print only the deterministic content, without run id and timestamps
    #[arg(long)]
    pub content_only: bool,
}

pub async fn execute(args: ResolveArgs) -> Result<()> {
    let (manifest, settings) = load_inputs(&args.manifest, args.settings.as_deref())?;
    info!(
        "Resolving {} ({} components)",
        args.manifest.display(),
        manifest.components.len()
    );

    let components = default_component_registry()?;
    let binders = default_binder_registry();
    let provisioner = InMemoryProvisioner::new(manifest.region.clone(), manifest.account.clone());
    let resolved = ResolutionPipeline::new(&components, &binders)
        .resolve_manifest(&manifest, Arc::new(provisioner.clone()), settings)
        .await
        .with_context(|| format!("Failed to resolve {}", args.manifest.display()))?;

    info!(
        "Resolved '{}' with {} provisioned resources",
        resolved.service,
        provisioner.resource_count()
    );

    let rendered = if args.content_only {
        let content: serde_json::Value = serde_json::from_str(&resolved.content_json()?)?;
        args.format.render(&content)?
    } else {
        args.format.render(&resolved)?
    };
    emit(&rendered, args.output.as_ref())
}
