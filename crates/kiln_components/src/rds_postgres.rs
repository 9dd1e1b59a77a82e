//! `rds-postgres`: a PostgreSQL instance with its security group and credentials secret.

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_config::{ComplianceFramework, ConfigProfile, RetentionFloor};
use kiln_core::capability::DB_POSTGRES;
use kiln_core::{Capability, Component, ComponentCreator, CoreResult, Synthesis};

use crate::common::{
    encryption_key, encryption_schema, logging_schema, monitoring_schema, provision,
    required_output,
};
use crate::provisioner::{RDS_INSTANCE, SECRET, SECURITY_GROUP};

pub const COMPONENT_TYPE: &str = "rds-postgres";

pub struct RdsPostgresProfile;

impl ConfigProfile for RdsPostgresProfile {
    fn fallback(&self) -> Value {
        json!({
            "dbName": "app",
            "engineVersion": "15",
            "instanceClass": "db.t3.micro",
            "allocatedStorageGb": 20,
            "port": 5432,
            "multiAz": false,
            "backupRetentionDays": 7,
            "deletionProtection": false,
            "encryption": {"customerManagedKey": false},
            "monitoring": {
                "enabled": false,
                "performanceInsights": false,
                "enhancedMonitoringIntervalSeconds": 0
            },
            "logging": {"retentionDays": 30}
        })
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        let interval = if posture.detailed_monitoring { 60 } else { 0 };
        json!({
            "backupRetentionDays": posture.backup_retention_days,
            "deletionProtection": framework.is_regulated(),
            "encryption": {"customerManagedKey": posture.customer_managed_key},
            "monitoring": {
                "enabled": posture.monitoring_required,
                "performanceInsights": posture.detailed_monitoring,
                "enhancedMonitoringIntervalSeconds": interval
            },
            "logging": {"retentionDays": posture.log_retention_days}
        })
    }

    fn environment_defaults(&self, environment: &str) -> Value {
        match environment {
            "prod" | "production" => json!({
                "instanceClass": "db.r6g.large",
                "multiAz": true,
                "deletionProtection": true,
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
                "dbName": {"type": "string", "pattern": "^[a-zA-Z][a-zA-Z0-9_]{0,62}$"},
                "engineVersion": {"type": "string"},
                "instanceClass": {"type": "string", "pattern": "^db\\."},
                "allocatedStorageGb": {"type": "integer", "minimum": 20, "maximum": 65536},
                "port": {"type": "integer", "minimum": 1024, "maximum": 65535},
                "multiAz": {"type": "boolean"},
                "backupRetentionDays": {"type": "integer", "minimum": 0, "maximum": 35},
                "deletionProtection": {"type": "boolean"},
                "encryption": encryption_schema(),
                "monitoring": monitoring_schema(json!({
                    "performanceInsights": {"type": "boolean"},
                    "enhancedMonitoringIntervalSeconds": {"enum": [0, 1, 5, 10, 15, 30, 60]}
                })),
                "logging": logging_schema()
            }
        })
    }

    fn governance_flags(&self, framework: ComplianceFramework) -> Vec<&'static str> {
        let mut flags = vec!["/monitoring/enabled", "/deletionProtection"];
        if framework.is_regulated() {
            flags.push("/encryption/customerManagedKey");
        }
        flags
    }

    fn retention_floors(&self, framework: ComplianceFramework) -> Vec<RetentionFloor> {
        let posture = framework.posture();
        vec![
            RetentionFloor::new("/backupRetentionDays", posture.backup_retention_days),
            RetentionFloor::new("/logging/retentionDays", posture.log_retention_days),
        ]
    }
}

pub struct RdsPostgresCreator;

#[async_trait]
impl ComponentCreator for RdsPostgresCreator {
    fn component_type(&self) -> &str {
        COMPONENT_TYPE
    }

    fn description(&self) -> &str {
        "PostgreSQL database on RDS"
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &RdsPostgresProfile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        vec![DB_POSTGRES]
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let config = component.config()?;
        let context = component.context();
        let name = context.resource_name(component.name());
        let port = config.get_u64("/port").unwrap_or(5432);

        let key = encryption_key(component).await?;

        let security_group = provision(
            component,
            "securityGroup",
            SECURITY_GROUP,
            json!({
                "name": format!("{}-db", name),
                "vpcId": context.network.as_ref().map(|n| n.id.clone())
            }),
        )
        .await?;

        let secret = provision(
            component,
            "secret",
            SECRET,
            json!({
                "name": format!("{}-credentials", name),
                "kmsKeyId": key.as_ref().map(|k| k.id.clone())
            }),
        )
        .await?;

        let instance = provision(
            component,
            "instance",
            RDS_INSTANCE,
            json!({
                "name": name,
                "engine": "postgres",
                "engineVersion": config.get_str("/engineVersion"),
                "instanceClass": config.get_str("/instanceClass"),
                "allocatedStorageGb": config.get_u64("/allocatedStorageGb"),
                "port": port,
                "dbName": config.get_str("/dbName"),
                "multiAz": config.get_bool("/multiAz"),
                "backupRetentionDays": config.get_u64("/backupRetentionDays"),
                "deletionProtection": config.get_bool("/deletionProtection"),
                "storageEncrypted": true,
                "kmsKeyId": key.as_ref().map(|k| k.id.clone()),
                "securityGroupIds": [security_group.handle.id.clone()],
                "credentialsSecretArn": secret.handle.id.clone()
            }),
        )
        .await?;

        let capability = Capability::new(DB_POSTGRES)
            .with_field("host", required_output(component, &instance, "endpoint")?)
            .with_field("port", required_output(component, &instance, "port")?)
            .with_field("dbName", config.get_str("/dbName").unwrap_or("app"))
            .with_field("secretArn", required_output(component, &secret, "arn")?)
            .with_field("securityGroupId", required_output(component, &security_group, "id")?)
            .with_field("instanceArn", required_output(component, &instance, "arn")?);

        let mut synthesis = Synthesis::new()
            .with_capability(capability)
            .with_construct("instance", instance.handle)
            .with_construct("securityGroup", security_group.handle)
            .with_construct("secret", secret.handle);
        if let Some(key) = key {
            synthesis = synthesis.with_construct("encryptionKey", key);
        }
        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kiln_config::ConfigError;
    use kiln_core::{ComponentContext, ComponentSpec, CoreError};

    use crate::InMemoryProvisioner;

    fn database(environment: &str, config: Value) -> CoreResult<Component> {
        let context = ComponentContext::new(
            "shop",
            environment,
            ComplianceFramework::Moderate,
            Arc::new(InMemoryProvisioner::default()),
        );
        kiln_core::process_component(
            Arc::new(RdsPostgresCreator),
            &ComponentSpec::new("orders-db", COMPONENT_TYPE).with_config(config),
            &context,
        )
    }

    #[tokio::test]
    async fn test_capability_carries_connection_fields() {
        let mut component = database("dev", json!({"dbName": "orders", "port": 6432})).unwrap();
        component.synth().await.unwrap();

        let capability = component.capability(DB_POSTGRES).unwrap();
        assert_eq!(capability.field_string("port").unwrap(), "6432");
        assert_eq!(capability.field_string("dbName").unwrap(), "orders");
        assert!(capability
            .field_string("host")
            .unwrap()
            .starts_with("shop-dev-orders-db."));
        assert_eq!(
            capability.field_string("securityGroupId").unwrap(),
            component.construct("securityGroup").unwrap().id
        );
    }

    #[test]
    fn test_moderate_tier_defaults() {
        let component = database("dev", Value::Null).unwrap();
        let config = component.config().unwrap();

        assert_eq!(config.get_u64("/backupRetentionDays"), Some(14));
        assert_eq!(config.get_u64("/logging/retentionDays"), Some(365));
        assert_eq!(config.get_bool("/encryption/customerManagedKey"), Some(true));
        assert_eq!(config.get_bool("/monitoring/performanceInsights"), Some(false));
    }

    #[test]
    fn test_prod_defaults() {
        let component = database("prod", Value::Null).unwrap();
        let config = component.config().unwrap();

        assert_eq!(config.get_bool("/multiAz"), Some(true));
        assert_eq!(config.get_str("/instanceClass"), Some("db.r6g.large"));
    }

    #[test]
    fn test_deletion_protection_is_governed_in_prod() {
        let err = database("prod", json!({"deletionProtection": false})).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::GovernanceViolation { ref path, .. }) if path == "/deletionProtection"
        ));
    }

    #[test]
    fn test_invalid_db_name() {
        let err = database("dev", json!({"dbName": "orders-db"})).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::Schema { ref path, .. }) if path == "/dbName"));
    }
}
