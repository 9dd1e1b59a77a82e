//! Platform-wide settings feeding the environment and governance layers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigResult;

/// Settings owned by the platform team rather than by service manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    /// Environments in which governance-critical flags cannot be disabled.
    #[serde(default = "default_restricted_environments")]
    pub restricted_environments: Vec<String>,
    /// Extra defaults per environment, then per component type.
    #[serde(default)]
    pub environment_defaults: BTreeMap<String, BTreeMap<String, Value>>,
    /// Values forced on every component of a type, above manifest values.
    #[serde(default)]
    pub governance_overrides: BTreeMap<String, Value>,
}

fn default_restricted_environments() -> Vec<String> {
    vec!["prod".to_string(), "production".to_string()]
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            restricted_environments: default_restricted_environments(),
            environment_defaults: BTreeMap::new(),
            governance_overrides: BTreeMap::new(),
        }
    }
}

impl PlatformSettings {
    /// Load settings from a YAML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::from_yaml_str(&content)?;
        debug!("Loaded platform settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save settings to a YAML file.
    pub fn to_file(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn is_restricted(&self, environment: &str) -> bool {
        self.restricted_environments
            .iter()
            .any(|env| env.eq_ignore_ascii_case(environment))
    }

    pub fn environment_defaults_for(&self, environment: &str, component_type: &str) -> Value {
        self.environment_defaults
            .get(environment)
            .and_then(|by_type| by_type.get(component_type))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn governance_overrides_for(&self, component_type: &str) -> Value {
        self.governance_overrides
            .get(component_type)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn with_restricted_environment(mut self, environment: impl Into<String>) -> Self {
        self.restricted_environments.push(environment.into());
        self
    }

    pub fn with_environment_default(
        mut self,
        environment: impl Into<String>,
        component_type: impl Into<String>,
        config: Value,
    ) -> Self {
        self.environment_defaults
            .entry(environment.into())
            .or_default()
            .insert(component_type.into(), config);
        self
    }

    pub fn with_governance_override(mut self, component_type: impl Into<String>, config: Value) -> Self {
        self.governance_overrides.insert(component_type.into(), config);
        self
    }
}
