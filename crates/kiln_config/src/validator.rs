//! Post-merge validation: schema conformance and governance guards.

use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::profile::RetentionFloor;
use crate::settings::PlatformSettings;

/// Validates merged configurations against a profile's JSON Schema.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate `instance` against `schema`.
    ///
    /// The first violation is reported with the JSON pointer of the offending
    /// value. For unexpected keys the pointer names the key itself.
    pub fn validate(component: &str, schema: &Value, instance: &Value) -> ConfigResult<()> {
        let compiled = JSONSchema::compile(schema).map_err(|e| ConfigError::InvalidSchema {
            component: component.to_string(),
            message: e.to_string(),
        })?;

        let result = compiled.validate(instance);
        if let Err(errors) = result {
            let errors: Vec<_> = errors.collect();
            if let Some(first) = errors.first() {
                let mut path = first.instance_path.to_string();
                if let ValidationErrorKind::AdditionalProperties { unexpected } = &first.kind {
                    if let Some(key) = unexpected.first() {
                        path = format!("{}/{}", path.trim_end_matches('/'), key);
                    }
                }
                if path.is_empty() {
                    path = "/".to_string();
                }

                let mut message = first.to_string();
                if errors.len() > 1 {
                    message.push_str(&format!(" (and {} more)", errors.len() - 1));
                }

                return Err(ConfigError::Schema {
                    component: component.to_string(),
                    path,
                    message,
                });
            }
        }

        debug!("Configuration for '{}' passed schema validation", component);
        Ok(())
    }
}

/// Rejects manifests that switch off governance-critical flags, or lower
/// retention below a floor, in restricted environments.
pub struct GovernanceValidator;

impl GovernanceValidator {
    /// Check the manifest fragment (not the merged result) so that only explicit
    /// attempts to disable a flag are reported.
    pub fn validate(
        component: &str,
        flags: &[&str],
        manifest: &Value,
        environment: &str,
        settings: &PlatformSettings,
    ) -> ConfigResult<()> {
        if !settings.is_restricted(environment) {
            return Ok(());
        }

        for flag in flags {
            if let Some(Value::Bool(false)) = manifest.pointer(flag) {
                return Err(ConfigError::GovernanceViolation {
                    component: component.to_string(),
                    path: flag.to_string(),
                    environment: environment.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Check the manifest fragment against retention floors.
    pub fn validate_floors(
        component: &str,
        floors: &[RetentionFloor],
        manifest: &Value,
        environment: &str,
        settings: &PlatformSettings,
    ) -> ConfigResult<()> {
        if !settings.is_restricted(environment) {
            return Ok(());
        }

        for floor in floors {
            let Some(days) = manifest.pointer(floor.path).and_then(Value::as_u64) else {
                continue;
            };
            if days < floor.minimum {
                return Err(ConfigError::BelowGovernanceFloor {
                    component: component.to_string(),
                    path: floor.path.to_string(),
                    minimum: floor.minimum,
                    environment: environment.to_string(),
                });
            }
        }

        Ok(())
    }
}
