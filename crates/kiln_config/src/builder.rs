//! Assembles the configuration layers for one component and validates the result.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::compliance::ComplianceFramework;
use crate::error::{ConfigError, ConfigResult};
use crate::layer::{merge_layers, ConfigLayer, LayerPriority};
use crate::profile::ConfigProfile;
use crate::settings::PlatformSettings;
use crate::validator::{GovernanceValidator, SchemaValidator};

/// The slice of the deployment context that influences configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildContext {
    pub environment: String,
    pub compliance_framework: ComplianceFramework,
}

impl BuildContext {
    pub fn new(environment: impl Into<String>, compliance_framework: ComplianceFramework) -> Self {
        Self {
            environment: environment.into(),
            compliance_framework,
        }
    }
}

/// A merged, derived and validated component configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    value: Value,
    layers: Vec<String>,
}

impl ResolvedConfig {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Names of the non-empty layers that contributed, in merge order.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Look up a nested value by JSON pointer.
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.value.pointer(pointer)
    }

    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.get(pointer).and_then(Value::as_str)
    }

    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.get(pointer).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, pointer: &str) -> Option<u64> {
        self.get(pointer).and_then(Value::as_u64)
    }

    /// Deserialize into a typed configuration struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// Builds one component's configuration from its prioritized layers.
pub struct ConfigBuilder<'a> {
    component: String,
    component_type: String,
    profile: &'a dyn ConfigProfile,
    context: &'a BuildContext,
    settings: &'a PlatformSettings,
    manifest: Value,
    extra_layers: Vec<ConfigLayer>,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(
        component: impl Into<String>,
        profile: &'a dyn ConfigProfile,
        context: &'a BuildContext,
        settings: &'a PlatformSettings,
    ) -> Self {
        Self {
            component: component.into(),
            component_type: String::new(),
            profile,
            context,
            settings,
            manifest: Value::Null,
            extra_layers: Vec::new(),
        }
    }

    /// Component type used to look up platform settings.
    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = component_type.into();
        self
    }

    /// Values declared in the component's manifest entry.
    pub fn with_manifest(mut self, manifest: Value) -> Self {
        self.manifest = manifest;
        self
    }

    /// Add a custom layer. Equal priorities are applied after the built-in layer.
    pub fn with_layer(mut self, layer: ConfigLayer) -> Self {
        self.extra_layers.push(layer);
        self
    }

    /// All layers in registration order (merge order is decided by priority).
    pub fn layers(&self) -> Vec<ConfigLayer> {
        let framework = self.context.compliance_framework;
        let environment = &self.context.environment;

        let mut layers = vec![
            ConfigLayer::new("fallback", LayerPriority::FALLBACK, self.profile.fallback()),
            ConfigLayer::new(
                format!("compliance:{}", framework),
                LayerPriority::COMPLIANCE,
                self.profile.compliance_defaults(framework),
            ),
            ConfigLayer::new(
                format!("environment:{}", environment),
                LayerPriority::ENVIRONMENT,
                self.profile.environment_defaults(environment),
            ),
            ConfigLayer::new(
                format!("settings-environment:{}", environment),
                LayerPriority::SETTINGS_ENVIRONMENT,
                self.settings
                    .environment_defaults_for(environment, &self.component_type),
            ),
            ConfigLayer::new("manifest", LayerPriority::MANIFEST, self.manifest.clone()),
            ConfigLayer::new(
                "governance",
                LayerPriority::GOVERNANCE,
                self.settings.governance_overrides_for(&self.component_type),
            ),
        ];
        layers.extend(self.extra_layers.iter().cloned());
        layers
    }

    /// Merge, derive, and validate.
    pub fn build(&self) -> ConfigResult<ResolvedConfig> {
        let mut layers = self.layers();
        layers.retain(|layer| !layer.is_empty());

        let mut value = merge_layers(&layers)?;
        self.profile.derive_defaults(&mut value);

        SchemaValidator::validate(&self.component, &self.profile.schema(), &value)?;
        self.profile
            .validate(&value)
            .map_err(|violation| ConfigError::Schema {
                component: self.component.clone(),
                path: violation.path,
                message: violation.message,
            })?;
        let framework = self.context.compliance_framework;
        GovernanceValidator::validate(
            &self.component,
            &self.profile.governance_flags(framework),
            &self.manifest,
            &self.context.environment,
            self.settings,
        )?;
        GovernanceValidator::validate_floors(
            &self.component,
            &self.profile.retention_floors(framework),
            &self.manifest,
            &self.context.environment,
            self.settings,
        )?;

        layers.sort_by_key(|layer| layer.priority);
        let names: Vec<String> = layers.into_iter().map(|layer| layer.name).collect();
        debug!(
            "Resolved configuration for '{}' from layers {:?}",
            self.component, names
        );

        Ok(ResolvedConfig {
            value,
            layers: names,
        })
    }
}

impl std::fmt::Debug for ConfigBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("component", &self.component)
            .field("component_type", &self.component_type)
            .field("context", &self.context)
            .field("extra_layers", &self.extra_layers.len())
            .finish()
    }
}
