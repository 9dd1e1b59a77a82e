//! # kiln_binder
//!
//! Strategy-based binding between components.
//!
//! A binding directive asks for a source component to be wired to a capability
//! published by a target. The [`ComponentBinder`] picks the first registered
//! [`BinderStrategy`] that handles the `(source type, capability)` pair and
//! returns the resulting [`kiln_core::BindingResult`]: environment variables,
//! least-privilege policy statements with compliance conditions, network
//! rules and extra configuration. Strategies never touch the provisioner;
//! [`ComponentBinder::wire`] and [`ComponentBinder::wire_all`] send the
//! accumulated network rules and grants once all bindings are applied.
//!
//! # Built-in strategies
//!
//! | Strategy   | Capability    | Sources |
//! |------------|---------------|---------|
//! | `queue`    | `queue:sqs`   | `lambda-api`, `lambda-worker` |
//! | `database` | `db:postgres` | same |
//! | `bucket`   | `bucket:s3`   | same |
//! | `table`    | `db:dynamodb` | same |
//!
//! # Example
//!
//! ```rust,ignore
//! use kiln_binder::{BinderRegistry, ComponentBinder};
//!
//! let registry = BinderRegistry::with_builtin_strategies();
//! let binder = ComponentBinder::new(&registry);
//! let result = binder.bind(&api, &queue, &directive).await?;
//! api.apply_binding(result)?;
//! binder.wire(&api).await?;
//! ```

pub mod actions;
pub mod binder;
pub mod error;
pub mod hardening;
pub mod registry;
pub mod strategies;
pub mod strategy;

pub use actions::ActionMatrix;
pub use binder::ComponentBinder;
pub use error::{BinderError, BinderResult};
pub use hardening::ComplianceHardening;
pub use registry::BinderRegistry;
pub use strategies::{
    BucketBinderStrategy, DatabaseBinderStrategy, QueueBinderStrategy, TableBinderStrategy,
};
pub use strategy::{BinderStrategy, BindingContext, COMPUTE_SOURCES};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use kiln_components::{builtin_registry, InMemoryProvisioner};
    use kiln_config::ComplianceFramework;
    use kiln_core::{Component, ComponentContext, ComponentSpec, ConstructHandle};

    /// One synthesized component of each built-in kind.
    pub struct Fixture {
        pub provisioner: InMemoryProvisioner,
        pub api: Component,
        pub queue: Component,
        pub database: Component,
        pub bucket: Component,
        pub table: Component,
    }

    impl Fixture {
        pub async fn new(framework: ComplianceFramework) -> Self {
            Self::with_network(framework, None).await
        }

        pub async fn with_network(
            framework: ComplianceFramework,
            network: Option<ConstructHandle>,
        ) -> Self {
            let provisioner = InMemoryProvisioner::default();
            let mut context =
                ComponentContext::new("shop", "dev", framework, Arc::new(provisioner.clone()));
            if let Some(network) = network {
                context = context.with_network(network);
            }
            let registry = builtin_registry().unwrap();

            let build = |name: &str, component_type: &str| {
                registry
                    .create_component(&ComponentSpec::new(name, component_type), &context)
                    .unwrap()
            };
            let mut api = build("api", "lambda-api");
            let mut queue = build("jobs", "sqs-queue");
            let mut database = build("orders-db", "rds-postgres");
            let mut bucket = build("assets", "s3-bucket");
            let mut table = build("orders", "dynamodb-table");

            for component in [&mut api, &mut queue, &mut database, &mut bucket, &mut table] {
                component.synth().await.unwrap();
            }

            Self {
                provisioner,
                api,
                queue,
                database,
                bucket,
                table,
            }
        }
    }
}
