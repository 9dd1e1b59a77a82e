//! `sqs-queue`: a message queue with an optional dead-letter queue.

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_config::{ComplianceFramework, ConfigProfile, ConfigViolation};
use kiln_core::capability::QUEUE_SQS;
use kiln_core::{Capability, Component, ComponentCreator, CoreResult, Synthesis};

use crate::common::{
    encryption_key, encryption_schema, monitoring_schema, provision, required_output,
};
use crate::provisioner::SQS_QUEUE;

pub const COMPONENT_TYPE: &str = "sqs-queue";

/// Longest retention SQS accepts, in seconds (14 days).
const MAX_RETENTION_SECONDS: u64 = 1_209_600;

pub struct SqsQueueProfile;

impl ConfigProfile for SqsQueueProfile {
    fn fallback(&self) -> Value {
        json!({
            "fifo": false,
            "visibilityTimeoutSeconds": 30,
            "messageRetentionSeconds": 345600,
            "deadLetterQueue": {"enabled": false, "maxReceiveCount": 3},
            "encryption": {"customerManagedKey": false},
            "monitoring": {
                "enabled": false,
                "ageOfOldestMessageThresholdSeconds": 300
            }
        })
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        let retention = if framework.is_regulated() {
            MAX_RETENTION_SECONDS
        } else {
            345600
        };
        json!({
            "messageRetentionSeconds": retention,
            "deadLetterQueue": {"enabled": posture.monitoring_required},
            "encryption": {"customerManagedKey": posture.customer_managed_key},
            "monitoring": {"enabled": posture.monitoring_required}
        })
    }

    fn environment_defaults(&self, environment: &str) -> Value {
        match environment {
            "prod" | "production" => json!({
                "deadLetterQueue": {"enabled": true},
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
                "fifo": {"type": "boolean"},
                "visibilityTimeoutSeconds": {"type": "integer", "minimum": 0, "maximum": 43200},
                "messageRetentionSeconds": {"type": "integer", "minimum": 60, "maximum": MAX_RETENTION_SECONDS},
                "deadLetterQueue": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "enabled": {"type": "boolean"},
                        "maxReceiveCount": {"type": "integer", "minimum": 1, "maximum": 1000}
                    }
                },
                "encryption": encryption_schema(),
                "monitoring": monitoring_schema(json!({
                    "ageOfOldestMessageThresholdSeconds": {"type": "integer", "minimum": 1}
                }))
            }
        })
    }

    fn validate(&self, config: &Value) -> Result<(), ConfigViolation> {
        let visibility = config
            .pointer("/visibilityTimeoutSeconds")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let retention = config
            .pointer("/messageRetentionSeconds")
            .and_then(Value::as_u64)
            .unwrap_or(MAX_RETENTION_SECONDS);
        if visibility > retention {
            return Err(ConfigViolation::new(
                "/visibilityTimeoutSeconds",
                "visibility timeout exceeds message retention",
            ));
        }
        Ok(())
    }
}

pub struct SqsQueueCreator;

#[async_trait]
impl ComponentCreator for SqsQueueCreator {
    fn component_type(&self) -> &str {
        COMPONENT_TYPE
    }

    fn description(&self) -> &str {
        "SQS queue with optional dead-letter queue"
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &SqsQueueProfile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        vec![QUEUE_SQS]
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let config = component.config()?;
        let fifo = config.get_bool("/fifo").unwrap_or(false);
        let suffix = if fifo { ".fifo" } else { "" };
        let base_name = component.context().resource_name(component.name());

        let mut synthesis = Synthesis::new();
        let key = encryption_key(component).await?;

        let mut redrive = Value::Null;
        if config.get_bool("/deadLetterQueue/enabled").unwrap_or(false) {
            let dlq = provision(
                component,
                "deadLetterQueue",
                SQS_QUEUE,
                json!({
                    "name": format!("{}-dlq{}", base_name, suffix),
                    "fifo": fifo,
                    "messageRetentionSeconds": MAX_RETENTION_SECONDS
                }),
            )
            .await?;
            redrive = json!({
                "deadLetterTargetArn": required_output(component, &dlq, "arn")?,
                "maxReceiveCount": config.get_u64("/deadLetterQueue/maxReceiveCount").unwrap_or(3)
            });
            synthesis = synthesis.with_construct("deadLetterQueue", dlq.handle);
        }

        let queue = provision(
            component,
            "queue",
            SQS_QUEUE,
            json!({
                "name": format!("{}{}", base_name, suffix),
                "fifo": fifo,
                "visibilityTimeoutSeconds": config.get_u64("/visibilityTimeoutSeconds"),
                "messageRetentionSeconds": config.get_u64("/messageRetentionSeconds"),
                "kmsMasterKeyId": key.as_ref().map(|k| k.id.clone()),
                "redrivePolicy": redrive
            }),
        )
        .await?;

        let capability = Capability::new(QUEUE_SQS)
            .with_field("queueUrl", required_output(component, &queue, "url")?)
            .with_field("queueArn", required_output(component, &queue, "arn")?)
            .with_field("queueName", required_output(component, &queue, "name")?);

        synthesis = synthesis
            .with_capability(capability)
            .with_construct("queue", queue.handle);
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

    use kiln_core::{ComponentContext, ComponentSpec, ComponentState};

    use crate::InMemoryProvisioner;

    fn context(framework: ComplianceFramework) -> ComponentContext {
        ComponentContext::new("shop", "dev", framework, Arc::new(InMemoryProvisioner::default()))
    }

    fn queue(config: Value, framework: ComplianceFramework) -> CoreResult<Component> {
        kiln_core::process_component(
            Arc::new(SqsQueueCreator),
            &ComponentSpec::new("jobs", COMPONENT_TYPE).with_config(config),
            &context(framework),
        )
    }

    #[tokio::test]
    async fn test_baseline_queue_publishes_capability() {
        let mut component = queue(Value::Null, ComplianceFramework::Baseline).unwrap();
        component.synth().await.unwrap();

        let capability = component.capability(QUEUE_SQS).unwrap();
        assert_eq!(capability.field_string("queueName").unwrap(), "shop-dev-jobs");
        assert_eq!(component.construct_names().unwrap(), vec!["queue"]);
        assert_eq!(component.state(), ComponentState::Synthesized);
    }

    #[tokio::test]
    async fn test_regulated_queue_gets_key_and_dead_letter_queue() {
        let mut component = queue(Value::Null, ComplianceFramework::High).unwrap();
        component.synth().await.unwrap();

        let names = component.construct_names().unwrap();
        assert_eq!(names, vec!["deadLetterQueue", "encryptionKey", "queue"]);
        assert_eq!(
            component.config().unwrap().get_u64("/messageRetentionSeconds"),
            Some(MAX_RETENTION_SECONDS)
        );
    }

    #[tokio::test]
    async fn test_fifo_suffix() {
        let mut component = queue(json!({"fifo": true}), ComplianceFramework::Baseline).unwrap();
        component.synth().await.unwrap();

        let capability = component.capability(QUEUE_SQS).unwrap();
        assert_eq!(capability.field_string("queueName").unwrap(), "shop-dev-jobs.fifo");
    }

    #[test]
    fn test_visibility_longer_than_retention_rejected() {
        let err = queue(
            json!({"visibilityTimeoutSeconds": 600, "messageRetentionSeconds": 120}),
            ComplianceFramework::Baseline,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/visibilityTimeoutSeconds"));
    }
}
