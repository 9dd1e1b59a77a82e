//! Per-component-type configuration profiles.

use serde_json::Value;

use crate::compliance::ComplianceFramework;

/// A rule the schema cannot express, broken by a merged configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    pub path: String,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Lowest value a manifest may set at `path` in a restricted environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionFloor {
    pub path: &'static str,
    pub minimum: u64,
}

impl RetentionFloor {
    pub fn new(path: &'static str, minimum: impl Into<u64>) -> Self {
        Self {
            path,
            minimum: minimum.into(),
        }
    }
}

/// Supplies the layers, schema and derivation rules for one component type.
///
/// Only the fallback, compliance defaults and schema are mandatory. Profiles
/// with no environment-specific behavior or derived fields can rely on the
/// default methods.
pub trait ConfigProfile: Send + Sync {
    /// Hardcoded values used when nothing else supplies a key.
    fn fallback(&self) -> Value;

    /// Defaults contributed by the selected compliance tier.
    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value;

    /// Defaults for a deployment environment such as `dev` or `prod`.
    fn environment_defaults(&self, _environment: &str) -> Value {
        Value::Null
    }

    /// JSON Schema the merged configuration must satisfy.
    fn schema(&self) -> Value;

    /// Complete partially specified structures after merging.
    fn derive_defaults(&self, _config: &mut Value) {}

    /// Cross-field rules checked after schema validation.
    fn validate(&self, _config: &Value) -> Result<(), ConfigViolation> {
        Ok(())
    }

    /// JSON pointers of flags a manifest may not disable in restricted environments.
    ///
    /// Regulated tiers add the customer-managed key flag.
    fn governance_flags(&self, framework: ComplianceFramework) -> Vec<&'static str> {
        let mut flags = vec!["/monitoring/enabled"];
        if framework.is_regulated() {
            flags.push("/encryption/customerManagedKey");
        }
        flags
    }

    /// Retention values a manifest may not lower below the tier posture in
    /// restricted environments.
    fn retention_floors(&self, _framework: ComplianceFramework) -> Vec<RetentionFloor> {
        Vec::new()
    }
}
