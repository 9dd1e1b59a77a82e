//! # kiln_components
//!
//! Built-in component types for Kiln and a deterministic in-memory provisioner.
//!
//! | Type             | Publishes     | Constructs |
//! |------------------|---------------|------------|
//! | `sqs-queue`      | `queue:sqs`   | `queue`, `deadLetterQueue` |
//! | `rds-postgres`   | `db:postgres` | `instance`, `securityGroup`, `secret` |
//! | `s3-bucket`      | `bucket:s3`   | `bucket` |
//! | `dynamodb-table` | `db:dynamodb` | `table` |
//! | `lambda-api`     | `api:rest`    | `function`, `role`, `securityGroup` |
//! | `lambda-worker`  | none          | `function`, `role`, `securityGroup` |
//!
//! Data components also register `encryptionKey` when the resolved
//! configuration asks for a customer-managed key.

mod common;
pub mod dynamodb_table;
pub mod lambda;
pub mod provisioner;
pub mod rds_postgres;
pub mod s3_bucket;
pub mod sqs_queue;

use std::sync::Arc;

use kiln_core::{ComponentCreator, ComponentRegistry, CoreResult};

pub use dynamodb_table::DynamoDbTableCreator;
pub use lambda::{FunctionKind, LambdaFunctionCreator};
pub use provisioner::InMemoryProvisioner;
pub use rds_postgres::RdsPostgresCreator;
pub use s3_bucket::S3BucketCreator;
pub use sqs_queue::SqsQueueCreator;

/// Every built-in creator, in registration order.
pub fn builtin_creators() -> Vec<Arc<dyn ComponentCreator>> {
    vec![
        Arc::new(SqsQueueCreator),
        Arc::new(RdsPostgresCreator),
        Arc::new(S3BucketCreator),
        Arc::new(DynamoDbTableCreator),
        Arc::new(LambdaFunctionCreator::api()),
        Arc::new(LambdaFunctionCreator::worker()),
    ]
}

/// Register the built-in creators into an existing registry.
pub fn register_builtin(registry: &mut ComponentRegistry) -> CoreResult<()> {
    for creator in builtin_creators() {
        registry.register(creator)?;
    }
    Ok(())
}

/// A fresh registry holding the built-in creators.
pub fn builtin_registry() -> CoreResult<ComponentRegistry> {
    let mut registry = ComponentRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
}
