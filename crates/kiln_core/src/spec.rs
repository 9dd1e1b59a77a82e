//! Declarative component specifications as supplied by a manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// A component entry in a service manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub binds: Vec<BindingDirective>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Construct-level adjustments, consumed by the patch collaborator.
    #[serde(default)]
    pub overrides: Value,
    #[serde(default)]
    pub policy: Value,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            config: Value::Null,
            binds: Vec::new(),
            labels: BTreeMap::new(),
            overrides: Value::Null,
            policy: Value::Null,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_bind(mut self, directive: BindingDirective) -> Self {
        self.binds.push(directive);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_policy(mut self, policy: Value) -> Self {
        self.policy = policy;
        self
    }
}

/// Selects a bind target by type and labels instead of by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelector {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub with_labels: BTreeMap<String, String>,
}

impl TargetSelector {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            with_labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_labels.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, spec: &ComponentSpec) -> bool {
        spec.component_type == self.component_type
            && self
                .with_labels
                .iter()
                .all(|(k, v)| spec.labels.get(k) == Some(v))
    }
}

impl std::fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type={}", self.component_type)?;
        for (k, v) in &self.with_labels {
            write!(f, ",{}={}", k, v)?;
        }
        Ok(())
    }
}

/// A request to wire the owning component to a target's capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDirective {
    /// Explicit target component name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Type and label selector, used when `to` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<TargetSelector>,
    pub capability: String,
    /// Raw access level; parsed with [`BindingDirective::access_level`].
    pub access: String,
    /// Capability field -> environment variable name overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub options: Value,
}

impl BindingDirective {
    pub fn to(target: impl Into<String>, capability: impl Into<String>, access: impl Into<String>) -> Self {
        Self {
            to: Some(target.into()),
            select: None,
            capability: capability.into(),
            access: access.into(),
            env: BTreeMap::new(),
            options: Value::Null,
        }
    }

    pub fn select(
        selector: TargetSelector,
        capability: impl Into<String>,
        access: impl Into<String>,
    ) -> Self {
        Self {
            to: None,
            select: Some(selector),
            capability: capability.into(),
            access: access.into(),
            env: BTreeMap::new(),
            options: Value::Null,
        }
    }

    pub fn with_env(mut self, field: impl Into<String>, variable: impl Into<String>) -> Self {
        self.env.insert(field.into(), variable.into());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn access_level(&self) -> CoreResult<AccessLevel> {
        self.access.parse()
    }

    /// Human-readable reference to the target, for error messages.
    pub fn target_label(&self) -> String {
        match (&self.to, &self.select) {
            (Some(name), _) => name.clone(),
            (None, Some(selector)) => selector.to_string(),
            (None, None) => "<unspecified>".to_string(),
        }
    }

    /// Environment variable name for a capability field.
    pub fn env_name(&self, field: &str, default: &str) -> String {
        if let Some(name) = self.env.get(field) {
            return name.clone();
        }
        match self.options.get("envPrefix").and_then(Value::as_str) {
            Some(prefix) => format!("{}{}", prefix, default),
            None => default.to_string(),
        }
    }
}

/// Access a binding grants on the target capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    ReadWrite,
    /// Unrestricted; reserved for trusted internal components.
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::ReadWrite => "readwrite",
            AccessLevel::Admin => "admin",
        }
    }

    pub fn includes_read(&self) -> bool {
        matches!(self, AccessLevel::Read | AccessLevel::ReadWrite)
    }

    pub fn includes_write(&self) -> bool {
        matches!(self, AccessLevel::Write | AccessLevel::ReadWrite)
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "readwrite" | "read-write" => Ok(AccessLevel::ReadWrite),
            "admin" => Ok(AccessLevel::Admin),
            _ => Err(CoreError::UnsupportedAccessLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
