//! Validate command - Check a manifest without provisioning anything.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use kiln_components::InMemoryProvisioner;
use kiln_engine::{default_binder_registry, default_component_registry, ResolutionPipeline};

use super::{load_inputs, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the service manifest
    pub manifest: PathBuf,

    /// Platform settings file
    #[arg(short, long, env = "KILN_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Print the planned components in this format instead of a summary
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating manifest: {}", args.manifest.display());
    let (manifest, settings) = load_inputs(&args.manifest, args.settings.as_deref())?;

    let components = default_component_registry()?;
    let binders = default_binder_registry();
    let provisioner = InMemoryProvisioner::new(manifest.region.clone(), manifest.account.clone());
    let context = manifest.context(Arc::new(provisioner), settings);
    let plan = ResolutionPipeline::new(&components, &binders)
        .plan(&manifest.components, &context)
        .with_context(|| format!("Validation failed for {}", args.manifest.display()))?;
    let summary = plan.summary()?;

    if let Some(format) = args.format {
        println!("{}", format.render(&summary)?);
        return Ok(());
    }

    println!(
        "📋 {} ({}, {})",
        manifest.service,
        manifest.environment,
        manifest.compliance_framework
    );
    println!("   Resolution order: {}", plan.order().join(" → "));
    for component in &summary {
        println!("   ✅ {} ({})", component.name, component.component_type);
        for bind in &component.binds {
            println!(
                "      → {} {} [{}] via '{}'",
                bind.target, bind.capability, bind.access, bind.strategy
            );
        }
    }
    println!();
    println!("✅ Manifest is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_engine::{EngineError, ErrorKind};

    fn write(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("kiln.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_valid_manifest_passes() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write(
            &dir,
            "service: shop\nenvironment: dev\ncomponents:\n  - name: assets\n    type: s3-bucket\n",
        );

        let result = execute(ValidateArgs {
            manifest,
            settings: None,
            format: None,
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cycle_is_reported_with_kind() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write(
            &dir,
            r#"
service: shop
environment: dev
components:
  - name: a
    type: lambda-api
    binds:
      - to: b
        capability: api:rest
        access: read
  - name: b
    type: lambda-api
    binds:
      - to: a
        capability: api:rest
        access: read
"#,
        );

        let err = execute(ValidateArgs {
            manifest,
            settings: None,
            format: Some(OutputFormat::Json),
        })
        .await
        .unwrap_err();

        let engine = err.downcast_ref::<EngineError>().unwrap();
        assert_eq!(engine.kind(), ErrorKind::CyclicDependency);
    }
}
