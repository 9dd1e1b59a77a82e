//! Components and their lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use kiln_config::{deep_merge, ResolvedConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::binding::BindingResult;
use crate::capability::{Capability, CapabilityContracts};
use crate::construct::ConstructHandle;
use crate::context::ComponentContext;
use crate::creator::ComponentCreator;
use crate::error::{CoreError, CoreResult};
use crate::spec::ComponentSpec;

/// Lifecycle state. Transitions are strictly ordered and may not be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Created,
    Configured,
    /// Capabilities are frozen from here on.
    Synthesized,
    /// One or more bindings applied.
    Bound,
}

impl ComponentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentState::Created => "created",
            ComponentState::Configured => "configured",
            ComponentState::Synthesized => "synthesized",
            ComponentState::Bound => "bound",
        }
    }

    fn can_transition_to(self, next: ComponentState) -> bool {
        matches!(
            (self, next),
            (ComponentState::Created, ComponentState::Configured)
                | (ComponentState::Configured, ComponentState::Synthesized)
                | (ComponentState::Synthesized, ComponentState::Bound)
                | (ComponentState::Bound, ComponentState::Bound)
        )
    }
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a creator returns from synthesis.
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub capabilities: Vec<Capability>,
    pub constructs: BTreeMap<String, ConstructHandle>,
}

impl Synthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_construct(mut self, name: impl Into<String>, handle: ConstructHandle) -> Self {
        self.constructs.insert(name.into(), handle);
        self
    }
}

/// Serializable terminal view of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentArtifact {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub state: ComponentState,
    pub config: Value,
    pub capabilities: BTreeMap<String, BTreeMap<String, Value>>,
    pub constructs: BTreeMap<String, ConstructHandle>,
    pub binding: BindingResult,
}

/// A component instance moving through `Created -> Configured -> Synthesized -> Bound`.
pub struct Component {
    spec: ComponentSpec,
    context: ComponentContext,
    creator: Arc<dyn ComponentCreator>,
    state: ComponentState,
    config: Option<ResolvedConfig>,
    capabilities: BTreeMap<String, Capability>,
    constructs: BTreeMap<String, ConstructHandle>,
    binding: BindingResult,
}

impl Component {
    pub fn new(spec: ComponentSpec, context: ComponentContext, creator: Arc<dyn ComponentCreator>) -> Self {
        Self {
            spec,
            context,
            creator,
            state: ComponentState::Created,
            config: None,
            capabilities: BTreeMap::new(),
            constructs: BTreeMap::new(),
            binding: BindingResult::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn component_type(&self) -> &str {
        &self.spec.component_type
    }

    pub fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn is_synthesized(&self) -> bool {
        self.state >= ComponentState::Synthesized
    }

    /// Construct-level adjustments left for the patch collaborator.
    pub fn overrides(&self) -> &Value {
        &self.spec.overrides
    }

    pub fn policy(&self) -> &Value {
        &self.spec.policy
    }

    fn transition(&mut self, next: ComponentState) -> CoreResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                component: self.spec.name.clone(),
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!("Component '{}': {} -> {}", self.spec.name, self.state, next);
        self.state = next;
        Ok(())
    }

    fn require_synthesized(&self, operation: &str) -> CoreResult<()> {
        if self.is_synthesized() {
            Ok(())
        } else {
            Err(CoreError::NotSynthesized {
                component: self.spec.name.clone(),
                operation: operation.to_string(),
            })
        }
    }

    /// Attach the resolved configuration.
    pub fn configure(&mut self, config: ResolvedConfig) -> CoreResult<()> {
        self.transition(ComponentState::Configured)?;
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> CoreResult<&ResolvedConfig> {
        self.config.as_ref().ok_or_else(|| CoreError::InvalidStateTransition {
            component: self.spec.name.clone(),
            from: self.state.to_string(),
            to: ComponentState::Configured.to_string(),
        })
    }

    /// Provision through the creator and freeze the published capabilities.
    pub async fn synth(&mut self) -> CoreResult<()> {
        if !self.state.can_transition_to(ComponentState::Synthesized) {
            return self.transition(ComponentState::Synthesized);
        }

        let creator = Arc::clone(&self.creator);
        let synthesis = creator.synthesize(self).await?;
        let published = creator.capability_keys();

        let mut capabilities = BTreeMap::new();
        for capability in synthesis.capabilities {
            if !published.contains(&capability.key.as_str()) {
                return Err(CoreError::CapabilityContract {
                    capability: capability.key.clone(),
                    message: format!(
                        "not published by component type '{}'",
                        self.spec.component_type
                    ),
                });
            }
            CapabilityContracts::validate(&capability)?;
            let key = capability.key.clone();
            if capabilities.insert(key.clone(), capability).is_some() {
                return Err(CoreError::CapabilityContract {
                    capability: key,
                    message: "published more than once".to_string(),
                });
            }
        }

        self.capabilities = capabilities;
        self.constructs = synthesis.constructs;
        self.transition(ComponentState::Synthesized)?;
        info!(
            "Synthesized '{}' ({}) with capabilities {:?}",
            self.spec.name,
            self.spec.component_type,
            self.capabilities.keys().collect::<Vec<_>>()
        );
        Ok(())
    }

    pub fn capabilities(&self) -> CoreResult<&BTreeMap<String, Capability>> {
        self.require_synthesized("read capabilities")?;
        Ok(&self.capabilities)
    }

    pub fn capability(&self, key: &str) -> CoreResult<&Capability> {
        self.capabilities()?
            .get(key)
            .ok_or_else(|| CoreError::CapabilityMissing {
                target: self.spec.name.clone(),
                capability: key.to_string(),
            })
    }

    pub fn construct(&self, name: &str) -> CoreResult<&ConstructHandle> {
        self.require_synthesized("read constructs")?;
        self.constructs
            .get(name)
            .ok_or_else(|| CoreError::ConstructNotFound {
                component: self.spec.name.clone(),
                construct: name.to_string(),
            })
    }

    pub fn construct_names(&self) -> CoreResult<Vec<&str>> {
        self.require_synthesized("read constructs")?;
        Ok(self.constructs.keys().map(|k| k.as_str()).collect())
    }

    /// Merge a binding into this component's deployment artifact.
    pub fn apply_binding(&mut self, result: BindingResult) -> CoreResult<()> {
        self.require_synthesized("apply a binding")?;

        for (name, value) in &result.environment_variables {
            if let Some(existing) = self.binding.environment_variables.get(name) {
                if existing != value {
                    return Err(CoreError::EnvironmentVariableConflict {
                        component: self.spec.name.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        self.transition(ComponentState::Bound)?;
        self.binding
            .environment_variables
            .extend(result.environment_variables);
        self.binding.access_policies.extend(result.access_policies);
        self.binding.network_rules.extend(result.network_rules);
        for (key, value) in result.additional_config {
            match self.binding.additional_config.get_mut(&key) {
                Some(existing) => deep_merge(existing, &value),
                None => {
                    self.binding.additional_config.insert(key, value);
                }
            }
        }
        Ok(())
    }

    pub fn binding(&self) -> &BindingResult {
        &self.binding
    }

    pub fn artifact(&self) -> CoreResult<ComponentArtifact> {
        self.require_synthesized("export an artifact")?;
        Ok(ComponentArtifact {
            name: self.spec.name.clone(),
            component_type: self.spec.component_type.clone(),
            state: self.state,
            config: self.config()?.value().clone(),
            capabilities: self
                .capabilities
                .iter()
                .map(|(k, c)| (k.clone(), c.fields.clone()))
                .collect(),
            constructs: self.constructs.clone(),
            binding: self.binding.clone(),
        })
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.spec.name)
            .field("type", &self.spec.component_type)
            .field("state", &self.state)
            .field("capabilities", &self.capabilities.keys().collect::<Vec<_>>())
            .field("constructs", &self.constructs.keys().collect::<Vec<_>>())
            .finish()
    }
}
