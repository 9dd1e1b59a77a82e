//! Compute sources consuming `bucket:s3`.

use async_trait::async_trait;

use kiln_core::capability::BUCKET_S3;
use kiln_core::{BindingResult, PolicyStatement};

use crate::actions::BUCKET_ACTIONS;
use crate::error::BinderResult;
use crate::strategy::{compute_sources, BinderStrategy, BindingContext};

/// Grants object access on the bucket and every key in it.
pub struct BucketBinderStrategy {
    sources: Vec<String>,
}

impl BucketBinderStrategy {
    pub fn new() -> Self {
        Self {
            sources: compute_sources(),
        }
    }

    pub fn with_sources(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

impl Default for BucketBinderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinderStrategy for BucketBinderStrategy {
    fn name(&self) -> &str {
        "bucket"
    }

    fn source_types(&self) -> &[String] {
        &self.sources
    }

    fn capability(&self) -> &str {
        BUCKET_S3
    }

    async fn bind(&self, context: &BindingContext<'_>) -> BinderResult<BindingResult> {
        let bucket = context.capability(BUCKET_S3)?;
        let bucket_arn = bucket.field_string("bucketArn")?;

        let statement = PolicyStatement::allow(
            BUCKET_ACTIONS.actions(context.access),
            vec![bucket_arn.clone(), format!("{}/*", bucket_arn)],
        )
        .with_conditions(context.hardening("s3")?);

        let mut result = BindingResult::new().with_policy(statement);
        result = context.export(result, bucket, "bucketName", "BUCKET_NAME")?;
        result = context.export(result, bucket, "bucketArn", "BUCKET_ARN")?;

        Ok(result)
    }
}
