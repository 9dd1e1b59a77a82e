//! `s3-bucket`: an object store bucket.

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_config::{ComplianceFramework, ConfigProfile, RetentionFloor};
use kiln_core::capability::BUCKET_S3;
use kiln_core::{Capability, Component, ComponentCreator, CoreResult, Synthesis};

use crate::common::{encryption_key, encryption_schema, monitoring_schema, provision, required_output};
use crate::provisioner::S3_BUCKET;

pub const COMPONENT_TYPE: &str = "s3-bucket";

pub struct S3BucketProfile;

impl ConfigProfile for S3BucketProfile {
    fn fallback(&self) -> Value {
        json!({
            "versioned": false,
            "publicAccess": "blocked",
            "encryption": {"customerManagedKey": false},
            "lifecycle": {"expireNoncurrentAfterDays": 30},
            "accessLogging": {"enabled": false, "retentionDays": 30},
            "monitoring": {"enabled": false}
        })
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        json!({
            "versioned": framework.is_regulated(),
            "encryption": {"customerManagedKey": posture.customer_managed_key},
            "accessLogging": {
                "enabled": framework.is_regulated(),
                "retentionDays": posture.log_retention_days
            },
            "monitoring": {"enabled": posture.monitoring_required}
        })
    }

    fn environment_defaults(&self, environment: &str) -> Value {
        match environment {
            "prod" | "production" => json!({"versioned": true, "monitoring": {"enabled": true}}),
            _ => Value::Null,
        }
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "versioned": {"type": "boolean"},
                "publicAccess": {"enum": ["blocked", "read"]},
                "encryption": encryption_schema(),
                "lifecycle": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "expireNoncurrentAfterDays": {"type": "integer", "minimum": 1},
                        "transitionToInfrequentAccessAfterDays": {"type": "integer", "minimum": 30}
                    }
                },
                "accessLogging": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "enabled": {"type": "boolean"},
                        "retentionDays": {"type": "integer", "minimum": 1}
                    }
                },
                "monitoring": monitoring_schema(Value::Null)
            }
        })
    }

    fn governance_flags(&self, framework: ComplianceFramework) -> Vec<&'static str> {
        let mut flags = vec!["/monitoring/enabled", "/accessLogging/enabled"];
        if framework.is_regulated() {
            flags.push("/encryption/customerManagedKey");
        }
        flags
    }

    fn retention_floors(&self, framework: ComplianceFramework) -> Vec<RetentionFloor> {
        vec![RetentionFloor::new(
            "/accessLogging/retentionDays",
            framework.posture().log_retention_days,
        )]
    }
}

pub struct S3BucketCreator;

#[async_trait]
impl ComponentCreator for S3BucketCreator {
    fn component_type(&self) -> &str {
        COMPONENT_TYPE
    }

    fn description(&self) -> &str {
        "S3 bucket"
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &S3BucketProfile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        vec![BUCKET_S3]
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let config = component.config()?;
        let context = component.context();
        // Bucket names are global, so the account is folded in.
        let name = format!("{}-{}", context.resource_name(component.name()), context.account);

        let key = encryption_key(component).await?;
        let bucket = provision(
            component,
            "bucket",
            S3_BUCKET,
            json!({
                "name": name,
                "versioned": config.get_bool("/versioned"),
                "publicAccess": config.get_str("/publicAccess"),
                "lifecycle": config.get("/lifecycle"),
                "accessLogging": config.get("/accessLogging"),
                "kmsKeyId": key.as_ref().map(|k| k.id.clone())
            }),
        )
        .await?;

        let capability = Capability::new(BUCKET_S3)
            .with_field("bucketName", required_output(component, &bucket, "name")?)
            .with_field("bucketArn", required_output(component, &bucket, "arn")?);

        let mut synthesis = Synthesis::new()
            .with_capability(capability)
            .with_construct("bucket", bucket.handle);
        if let Some(key) = key {
            synthesis = synthesis.with_construct("encryptionKey", key);
        }
        Ok(synthesis)
    }
}
