//! Connection artifacts produced by binder strategies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Policy statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// A condition block entry, e.g. `Bool aws:SecureTransport = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    pub operator: String,
    pub key: String,
    pub values: Vec<String>,
}

impl PolicyCondition {
    pub fn new(operator: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            key: key.into(),
            values: vec![value.into()],
        }
    }
}

/// An access-policy statement attached to the source component's principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<PolicyCondition>,
}

impl PolicyStatement {
    pub fn allow(actions: Vec<String>, resources: Vec<String>) -> Self {
        Self {
            effect: Effect::Allow,
            actions,
            resources,
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<PolicyCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// A connection-level allow rule between two security groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRule {
    /// Security group receiving the traffic.
    pub target_group: String,
    /// Security group the traffic originates from.
    pub source_group: String,
    pub protocol: String,
    pub port: u16,
    pub description: String,
}

impl NetworkRule {
    pub fn tcp(
        source_group: impl Into<String>,
        target_group: impl Into<String>,
        port: u16,
        description: impl Into<String>,
    ) -> Self {
        Self {
            target_group: target_group.into(),
            source_group: source_group.into(),
            protocol: "tcp".to_string(),
            port,
            description: description.into(),
        }
    }
}

/// Everything a binding contributes to the source's deployment artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingResult {
    pub environment_variables: BTreeMap<String, String>,
    pub access_policies: Vec<PolicyStatement>,
    pub network_rules: Vec<NetworkRule>,
    pub additional_config: BTreeMap<String, Value>,
}

impl BindingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_policy(mut self, statement: PolicyStatement) -> Self {
        self.access_policies.push(statement);
        self
    }

    pub fn with_network_rule(mut self, rule: NetworkRule) -> Self {
        self.network_rules.push(rule);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_config.insert(key.into(), value);
        self
    }

    /// All actions across every statement, sorted and de-duplicated.
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self
            .access_policies
            .iter()
            .flat_map(|p| p.actions.iter().map(|a| a.as_str()))
            .collect();
        actions.sort_unstable();
        actions.dedup();
        actions
    }

    pub fn is_empty(&self) -> bool {
        self.environment_variables.is_empty()
            && self.access_policies.is_empty()
            && self.network_rules.is_empty()
            && self.additional_config.is_empty()
    }
}
