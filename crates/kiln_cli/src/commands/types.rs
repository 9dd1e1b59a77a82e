//! Types command - List component types and binder strategies.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use kiln_engine::{default_binder_registry, default_component_registry};

use super::OutputFormat;

#[derive(Args)]
pub struct TypesArgs {
    /// Print as JSON or YAML instead of a table
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypeEntry {
    #[serde(rename = "type")]
    component_type: String,
    description: String,
    capabilities: Vec<&'static str>,
    /// Published capabilities no registered strategy can bind to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unconsumed: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Catalog {
    component_types: Vec<TypeEntry>,
    bindings: Vec<(String, String)>,
}

fn catalog() -> Result<Catalog> {
    let components = default_component_registry()?;
    let bindings = default_binder_registry().registered_pairs();

    let mut component_types = Vec::with_capacity(components.len());
    for component_type in components.types() {
        let creator = components.get_required(component_type)?;
        let capabilities = creator.capability_keys();
        let unconsumed = capabilities
            .iter()
            .copied()
            .filter(|key| !bindings.iter().any(|(_, capability)| capability.as_str() == *key))
            .collect();
        component_types.push(TypeEntry {
            component_type: component_type.to_string(),
            description: creator.description().to_string(),
            capabilities,
            unconsumed,
        });
    }

    Ok(Catalog {
        component_types,
        bindings,
    })
}

pub async fn execute(args: TypesArgs) -> Result<()> {
    let catalog = catalog()?;
    if let Some(format) = args.format {
        println!("{}", format.render(&catalog)?);
        return Ok(());
    }

    println!("📦 Component types:");
    for entry in &catalog.component_types {
        let published = if entry.capabilities.is_empty() {
            "-".to_string()
        } else {
            entry
                .capabilities
                .iter()
                .map(|key| {
                    if entry.unconsumed.contains(key) {
                        format!("{} (no binder)", key)
                    } else {
                        key.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "   {:<16} {:<14} {}",
            entry.component_type, published, entry.description
        );
    }
    println!();
    println!("🔗 Bindings (source type → capability):");
    for (source, capability) in &catalog.bindings {
        println!("   {:<20} → {}", source, capability);
    }
    for entry in catalog.component_types.iter().filter(|e| !e.unconsumed.is_empty()) {
        println!();
        println!(
            "ℹ️  {} publishes {} for outside callers; binding to it fails with NoBinderStrategy",
            entry.component_type,
            entry.unconsumed.join(", ")
        );
    }
    Ok(())
}
