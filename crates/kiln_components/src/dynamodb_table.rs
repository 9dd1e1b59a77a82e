//! `dynamodb-table`: a key-value table with optional provisioned auto-scaling.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use kiln_config::{ComplianceFramework, ConfigProfile, ConfigViolation};
use kiln_core::capability::DB_DYNAMODB;
use kiln_core::{Capability, Component, ComponentCreator, CoreResult, Synthesis};

use crate::common::{encryption_key, encryption_schema, monitoring_schema, provision, required_output};
use crate::provisioner::DYNAMODB_TABLE;

pub const COMPONENT_TYPE: &str = "dynamodb-table";

const DEFAULT_TARGET_UTILIZATION: u64 = 70;

pub struct DynamoDbTableProfile;

impl DynamoDbTableProfile {
    /// `min<Side>Capacity` falls back to the table's base capacity when a maximum is given.
    fn derive_side(scaling: &mut Map<String, Value>, base: Option<&Value>, side: &str) {
        let max_key = format!("max{}Capacity", side);
        let min_key = format!("min{}Capacity", side);
        if scaling.contains_key(&max_key) && !scaling.contains_key(&min_key) {
            if let Some(base) = base.filter(|v| v.is_u64()) {
                scaling.insert(min_key, base.clone());
            }
        }
    }
}

fn key_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["name", "type"],
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "type": {"enum": ["S", "N", "B"]}
        }
    })
}

impl ConfigProfile for DynamoDbTableProfile {
    fn fallback(&self) -> Value {
        json!({
            "billingMode": "pay-per-request",
            "partitionKey": {"name": "pk", "type": "S"},
            "pointInTimeRecovery": false,
            "encryption": {"customerManagedKey": false},
            "monitoring": {"enabled": false}
        })
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        json!({
            "pointInTimeRecovery": framework.is_regulated(),
            "encryption": {"customerManagedKey": posture.customer_managed_key},
            "monitoring": {"enabled": posture.monitoring_required}
        })
    }

    fn environment_defaults(&self, environment: &str) -> Value {
        match environment {
            "prod" | "production" => json!({
                "pointInTimeRecovery": true,
                "monitoring": {"enabled": true}
            }),
            _ => Value::Null,
        }
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "billingMode": {"enum": ["pay-per-request", "provisioned"]},
                "partitionKey": key_schema(),
                "sortKey": key_schema(),
                "readCapacity": {"type": "integer", "minimum": 1},
                "writeCapacity": {"type": "integer", "minimum": 1},
                "autoScaling": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "minReadCapacity": {"type": "integer", "minimum": 1},
                        "maxReadCapacity": {"type": "integer", "minimum": 1},
                        "minWriteCapacity": {"type": "integer", "minimum": 1},
                        "maxWriteCapacity": {"type": "integer", "minimum": 1},
                        "targetUtilizationPercent": {"type": "integer", "minimum": 20, "maximum": 90}
                    }
                },
                "pointInTimeRecovery": {"type": "boolean"},
                "timeToLiveAttribute": {"type": "string"},
                "encryption": encryption_schema(),
                "monitoring": monitoring_schema(Value::Null)
            },
            "if": {"properties": {"billingMode": {"const": "provisioned"}}},
            "then": {"required": ["readCapacity", "writeCapacity"]}
        })
    }

    fn derive_defaults(&self, config: &mut Value) {
        let read = config.get("readCapacity").cloned();
        let write = config.get("writeCapacity").cloned();
        let Some(scaling) = config.get_mut("autoScaling").and_then(Value::as_object_mut) else {
            return;
        };

        Self::derive_side(scaling, read.as_ref(), "Read");
        Self::derive_side(scaling, write.as_ref(), "Write");
        scaling
            .entry("targetUtilizationPercent")
            .or_insert_with(|| json!(DEFAULT_TARGET_UTILIZATION));
    }

    fn validate(&self, config: &Value) -> Result<(), ConfigViolation> {
        let Some(scaling) = config.get("autoScaling") else {
            return Ok(());
        };
        if config.get("billingMode").and_then(Value::as_str) != Some("provisioned") {
            return Err(ConfigViolation::new(
                "/autoScaling",
                "auto-scaling requires billingMode 'provisioned'",
            ));
        }
        for side in ["Read", "Write"] {
            let min = scaling.get(format!("min{}Capacity", side)).and_then(Value::as_u64);
            let max = scaling.get(format!("max{}Capacity", side)).and_then(Value::as_u64);
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(ConfigViolation::new(
                        format!("/autoScaling/min{}Capacity", side),
                        format!("minimum {} exceeds maximum {}", min, max),
                    ));
                }
            }
        }
        Ok(())
    }
}

pub struct DynamoDbTableCreator;

#[async_trait]
impl ComponentCreator for DynamoDbTableCreator {
    fn component_type(&self) -> &str {
        COMPONENT_TYPE
    }

    fn description(&self) -> &str {
        "DynamoDB table"
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &DynamoDbTableProfile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        vec![DB_DYNAMODB]
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let config = component.config()?;
        let name = component.context().resource_name(component.name());

        let key = encryption_key(component).await?;
        let table = provision(
            component,
            "table",
            DYNAMODB_TABLE,
            json!({
                "name": name,
                "billingMode": config.get_str("/billingMode"),
                "partitionKey": config.get("/partitionKey"),
                "sortKey": config.get("/sortKey"),
                "readCapacity": config.get_u64("/readCapacity"),
                "writeCapacity": config.get_u64("/writeCapacity"),
                "autoScaling": config.get("/autoScaling"),
                "pointInTimeRecovery": config.get_bool("/pointInTimeRecovery"),
                "kmsKeyId": key.as_ref().map(|k| k.id.clone())
            }),
        )
        .await?;

        let capability = Capability::new(DB_DYNAMODB)
            .with_field("tableName", required_output(component, &table, "name")?)
            .with_field("tableArn", required_output(component, &table, "arn")?);

        let mut synthesis = Synthesis::new()
            .with_capability(capability)
            .with_construct("table", table.handle);
        if let Some(key) = key {
            synthesis = synthesis.with_construct("encryptionKey", key);
        }
        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_side_bounds_are_derived() {
        let mut config = json!({
            "billingMode": "provisioned",
            "readCapacity": 5,
            "writeCapacity": 5,
            "autoScaling": {"maxReadCapacity": 200}
        });
        DynamoDbTableProfile.derive_defaults(&mut config);

        assert_eq!(
            config["autoScaling"],
            json!({"minReadCapacity": 5, "maxReadCapacity": 200, "targetUtilizationPercent": 70})
        );
    }

    #[test]
    fn test_both_sides_derived() {
        let mut config = json!({
            "readCapacity": 5,
            "writeCapacity": 10,
            "autoScaling": {"maxReadCapacity": 50, "maxWriteCapacity": 80, "targetUtilizationPercent": 60}
        });
        DynamoDbTableProfile.derive_defaults(&mut config);

        assert_eq!(config["autoScaling"]["minWriteCapacity"], 10);
        assert_eq!(config["autoScaling"]["minReadCapacity"], 5);
        assert_eq!(config["autoScaling"]["targetUtilizationPercent"], 60);
    }

    #[test]
    fn test_explicit_minimum_kept() {
        let mut config = json!({
            "readCapacity": 5,
            "autoScaling": {"minReadCapacity": 2, "maxReadCapacity": 50}
        });
        DynamoDbTableProfile.derive_defaults(&mut config);
        assert_eq!(config["autoScaling"]["minReadCapacity"], 2);
    }

    #[test]
    fn test_no_scaling_block_untouched() {
        let mut config = DynamoDbTableProfile.fallback();
        let before = config.clone();
        DynamoDbTableProfile.derive_defaults(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = json!({
            "billingMode": "provisioned",
            "readCapacity": 100,
            "writeCapacity": 5,
            "autoScaling": {"minReadCapacity": 100, "maxReadCapacity": 10}
        });
        let violation = DynamoDbTableProfile.validate(&config).unwrap_err();
        assert_eq!(violation.path, "/autoScaling/minReadCapacity");
    }

    #[test]
    fn test_scaling_requires_provisioned_billing() {
        let config = json!({"billingMode": "pay-per-request", "autoScaling": {"maxReadCapacity": 10}});
        assert!(DynamoDbTableProfile.validate(&config).is_err());
    }
}
