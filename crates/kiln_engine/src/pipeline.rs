//! Ordered resolution of a whole manifest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use kiln_binder::{BinderError, BinderRegistry, ComplianceHardening, ComponentBinder};
use kiln_config::{ComplianceFramework, PlatformSettings};
use kiln_core::{
    Component, ComponentArtifact, ComponentContext, ComponentRegistry, ComponentSpec, CoreError,
    CoreResult, Provisioner,
};

use crate::error::EngineResult;
use crate::graph::BindGraph;
use crate::manifest::Manifest;

/// A checked binding, before anything is provisioned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedBinding {
    pub target: String,
    pub capability: String,
    pub access: String,
    pub strategy: String,
}

/// A configured component and the bindings it will receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub config: Value,
    pub binds: Vec<PlannedBinding>,
}

/// Everything known about a manifest before synthesis.
pub struct ResolutionPlan {
    graph: BindGraph,
    order: Vec<usize>,
    components: Vec<Component>,
    bindings: Vec<Vec<PlannedBinding>>,
}

impl ResolutionPlan {
    /// Component names in resolution order.
    pub fn order(&self) -> Vec<String> {
        self.order
            .iter()
            .map(|&i| self.graph.name(i).to_string())
            .collect()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Serializable view, in manifest order.
    pub fn summary(&self) -> CoreResult<Vec<PlannedComponent>> {
        self.components
            .iter()
            .zip(&self.bindings)
            .map(|(component, binds)| {
                Ok(PlannedComponent {
                    name: component.name().to_string(),
                    component_type: component.component_type().to_string(),
                    config: component.config()?.value().clone(),
                    binds: binds.clone(),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ResolutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPlan")
            .field("order", &self.order())
            .field("components", &self.components)
            .finish()
    }
}

/// The terminal output of a resolution run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedManifest {
    pub run_id: Uuid,
    pub service: String,
    pub environment: String,
    pub compliance_framework: ComplianceFramework,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub order: Vec<String>,
    pub components: Vec<ComponentArtifact>,
}

#[derive(Serialize)]
struct ResolvedContent<'a> {
    order: &'a [String],
    components: &'a [ComponentArtifact],
}

impl ResolvedManifest {
    pub fn component(&self, name: &str) -> Option<&ComponentArtifact> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Order and artifacts as JSON, without run id or timestamps.
    ///
    /// Two runs over the same manifest and context produce identical content.
    pub fn content_json(&self) -> EngineResult<String> {
        let content = ResolvedContent {
            order: &self.order,
            components: &self.components,
        };
        Ok(serde_json::to_string_pretty(&content)?)
    }
}

/// Resolves component specs against a pair of registries.
///
/// Both registries are borrowed for the pipeline's lifetime and cannot change
/// while it runs.
pub struct ResolutionPipeline<'r> {
    components: &'r ComponentRegistry,
    binders: &'r BinderRegistry,
}

impl<'r> ResolutionPipeline<'r> {
    pub fn new(components: &'r ComponentRegistry, binders: &'r BinderRegistry) -> Self {
        Self {
            components,
            binders,
        }
    }

    /// Build the graph, configure every component and check every binding
    /// can be carried out. Nothing is provisioned.
    pub fn plan(
        &self,
        specs: &[ComponentSpec],
        context: &ComponentContext,
    ) -> EngineResult<ResolutionPlan> {
        let graph = BindGraph::build(specs)?;
        let order = graph.topological_order()?;

        let components = specs
            .iter()
            .map(|spec| self.components.create_component(spec, context))
            .collect::<CoreResult<Vec<_>>>()?;

        let mut bindings = Vec::with_capacity(specs.len());
        for (source, spec) in specs.iter().enumerate() {
            let mut planned = Vec::with_capacity(spec.binds.len());
            for edge in graph.edges(source) {
                let directive = &spec.binds[edge.directive];
                let target = &specs[edge.target];
                let access = directive.access_level()?;

                if ComplianceHardening::requires_network(context.compliance_framework)
                    && context.network.is_none()
                {
                    return Err(BinderError::NetworkRequired {
                        component: spec.name.clone(),
                        capability: directive.capability.clone(),
                    }
                    .into());
                }

                let creator = self.components.get_required(&target.component_type)?;
                if !creator.capability_keys().contains(&directive.capability.as_str()) {
                    return Err(CoreError::CapabilityMissing {
                        target: target.name.clone(),
                        capability: directive.capability.clone(),
                    }
                    .into());
                }

                let strategy = self
                    .binders
                    .find(&spec.component_type, &directive.capability)
                    .ok_or_else(|| BinderError::NoBinderStrategy {
                        source_type: spec.component_type.clone(),
                        capability: directive.capability.clone(),
                        registered: self.binders.registered_pairs(),
                    })?;

                planned.push(PlannedBinding {
                    target: target.name.clone(),
                    capability: directive.capability.clone(),
                    access: access.as_str().to_string(),
                    strategy: strategy.name().to_string(),
                });
            }
            bindings.push(planned);
        }

        debug!(
            "Planned {} components for '{}' ({})",
            components.len(),
            context.service_name,
            context.environment
        );
        Ok(ResolutionPlan {
            graph,
            order,
            components,
            bindings,
        })
    }

    /// Plan, then synthesize and bind each component in dependency order.
    ///
    /// The first error aborts the run. A component's bindings are applied only
    /// once all of its directives have been bound. Grants and network rules
    /// reach the provisioner only after every component has bound.
    pub async fn resolve(
        &self,
        specs: &[ComponentSpec],
        context: &ComponentContext,
    ) -> EngineResult<ResolvedManifest> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Resolving '{}' in {} ({}), run {}",
            context.service_name,
            context.environment,
            context.compliance_framework.as_str(),
            run_id
        );

        let mut plan = self.plan(specs, context)?;
        let binder = ComponentBinder::new(self.binders);

        for position in 0..plan.order.len() {
            let index = plan.order[position];
            plan.components[index].synth().await?;

            let mut results = Vec::with_capacity(plan.graph.edges(index).len());
            for edge in plan.graph.edges(index) {
                let source = &plan.components[index];
                let target = &plan.components[edge.target];
                let directive = &source.spec().binds[edge.directive];
                results.push(binder.bind(source, target, directive).await?);
            }
            for result in results {
                plan.components[index].apply_binding(result)?;
            }
        }

        let wired: Vec<&Component> = plan.order.iter().map(|&i| &plan.components[i]).collect();
        binder.wire_all(&wired).await?;

        let components = plan
            .components
            .iter()
            .map(Component::artifact)
            .collect::<CoreResult<Vec<_>>>()?;
        let completed_at = Utc::now();
        info!(
            "Resolved {} components for '{}' in {} ms",
            components.len(),
            context.service_name,
            (completed_at - started_at).num_milliseconds()
        );

        Ok(ResolvedManifest {
            run_id,
            service: context.service_name.clone(),
            environment: context.environment.clone(),
            compliance_framework: context.compliance_framework,
            started_at,
            completed_at,
            order: plan.order(),
            components,
        })
    }

    /// Resolve a loaded manifest against a provisioner and platform settings.
    pub async fn resolve_manifest(
        &self,
        manifest: &Manifest,
        scope: Arc<dyn Provisioner>,
        settings: PlatformSettings,
    ) -> EngineResult<ResolvedManifest> {
        let context = manifest.context(scope, settings);
        self.resolve(&manifest.components, &context).await
    }
}
