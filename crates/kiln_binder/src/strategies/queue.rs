//! Compute sources consuming `queue:sqs`.

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_core::capability::QUEUE_SQS;
use kiln_core::{BindingResult, PolicyStatement};

use crate::actions::QUEUE_ACTIONS;
use crate::error::BinderResult;
use crate::strategy::{compute_sources, BinderStrategy, BindingContext};

const DEFAULT_BATCH_SIZE: u64 = 10;

/// Grants queue access and, for consumers that ask for it, an event-source mapping.
///
/// Set `options.eventSource: true` on a read binding to have the source
/// polled by the queue; `options.batchSize` tunes the batch (default 10).
pub struct QueueBinderStrategy {
    sources: Vec<String>,
}

impl QueueBinderStrategy {
    pub fn new() -> Self {
        Self {
            sources: compute_sources(),
        }
    }

    pub fn with_sources(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

impl Default for QueueBinderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinderStrategy for QueueBinderStrategy {
    fn name(&self) -> &str {
        "queue"
    }

    fn source_types(&self) -> &[String] {
        &self.sources
    }

    fn capability(&self) -> &str {
        QUEUE_SQS
    }

    async fn bind(&self, context: &BindingContext<'_>) -> BinderResult<BindingResult> {
        let queue = context.capability(QUEUE_SQS)?;
        let queue_arn = queue.field_string("queueArn")?;

        let statement = PolicyStatement::allow(
            QUEUE_ACTIONS.actions(context.access),
            vec![queue_arn.clone()],
        )
        .with_conditions(context.hardening("sqs")?);

        let mut result = BindingResult::new().with_policy(statement);
        result = context.export(result, queue, "queueUrl", "QUEUE_URL")?;
        result = context.export(result, queue, "queueArn", "QUEUE_ARN")?;

        let options = &context.directive.options;
        let wants_events = options.get("eventSource").and_then(Value::as_bool) == Some(true);
        if wants_events && context.access.includes_read() {
            let batch_size = options
                .get("batchSize")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_BATCH_SIZE);
            result = result.with_config(
                "eventSources",
                json!({
                    (context.target.name()): {"queueArn": queue_arn, "batchSize": batch_size}
                }),
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::ComplianceFramework;
    use kiln_core::{AccessLevel, BindingDirective};

    use crate::test_support::Fixture;

    #[tokio::test]
    async fn test_read_binding() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let directive = BindingDirective::to("jobs", QUEUE_SQS, "read");
        let context = BindingContext::new(&fixture.api, &fixture.queue, &directive, AccessLevel::Read);

        let result = QueueBinderStrategy::new().bind(&context).await.unwrap();

        assert_eq!(
            result.actions(),
            vec![
                "sqs:DeleteMessage",
                "sqs:GetQueueAttributes",
                "sqs:GetQueueUrl",
                "sqs:ReceiveMessage"
            ]
        );
        assert_eq!(
            result.environment_variables["QUEUE_URL"],
            "https://sqs.us-east-1.amazonaws.com/000000000000/shop-dev-jobs"
        );
        assert!(result.environment_variables.contains_key("QUEUE_ARN"));
        assert!(result.additional_config.is_empty());
        assert!(fixture.provisioner.grants().is_empty());
    }

    #[tokio::test]
    async fn test_env_names_are_customizable() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let directive = BindingDirective::to("jobs", QUEUE_SQS, "write")
            .with_env("queueUrl", "JOBS_URL")
            .with_options(json!({"envPrefix": "JOBS_"}));
        let context =
            BindingContext::new(&fixture.api, &fixture.queue, &directive, AccessLevel::Write);

        let result = QueueBinderStrategy::new().bind(&context).await.unwrap();

        let names: Vec<&str> = result.environment_variables.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["JOBS_QUEUE_ARN", "JOBS_URL"]);
    }

    #[tokio::test]
    async fn test_event_source_mapping_for_consumers() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let directive = BindingDirective::to("jobs", QUEUE_SQS, "read")
            .with_options(json!({"eventSource": true, "batchSize": 5}));
        let context = BindingContext::new(&fixture.api, &fixture.queue, &directive, AccessLevel::Read);

        let result = QueueBinderStrategy::new().bind(&context).await.unwrap();

        assert_eq!(result.additional_config["eventSources"]["jobs"]["batchSize"], 5);
    }

    #[tokio::test]
    async fn test_regulated_statement_conditions() {
        let fixture = Fixture::new(ComplianceFramework::Moderate).await;
        let directive = BindingDirective::to("jobs", QUEUE_SQS, "readwrite");
        let context =
            BindingContext::new(&fixture.api, &fixture.queue, &directive, AccessLevel::ReadWrite);

        let result = QueueBinderStrategy::new().bind(&context).await.unwrap();

        let keys: Vec<&str> = result.access_policies[0]
            .conditions
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(keys, vec!["aws:SecureTransport", "kms:ViaService"]);
    }
}
