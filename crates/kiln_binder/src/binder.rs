//! Orchestrates strategy lookup and execution for one binding directive.

use tracing::{debug, info};

use kiln_core::{BindingDirective, BindingResult, Component, CoreError, GrantRequest};

use crate::error::{BinderError, BinderResult};
use crate::registry::BinderRegistry;
use crate::strategy::BindingContext;

/// Binds a source component to a target's capability.
pub struct ComponentBinder<'r> {
    registry: &'r BinderRegistry,
}

impl<'r> ComponentBinder<'r> {
    pub fn new(registry: &'r BinderRegistry) -> Self {
        Self { registry }
    }

    /// Run the first matching strategy and return its artifacts.
    ///
    /// The result is not applied to `source`; callers decide when to merge it.
    pub async fn bind(
        &self,
        source: &Component,
        target: &Component,
        directive: &BindingDirective,
    ) -> BinderResult<BindingResult> {
        let access = directive.access_level()?;

        for component in [source, target] {
            if !component.is_synthesized() {
                return Err(CoreError::NotSynthesized {
                    component: component.name().to_string(),
                    operation: format!("bind '{}'", directive.capability),
                }
                .into());
            }
        }

        let strategy = self
            .registry
            .find(source.component_type(), &directive.capability)
            .ok_or_else(|| BinderError::NoBinderStrategy {
                source_type: source.component_type().to_string(),
                capability: directive.capability.clone(),
                registered: self.registry.registered_pairs(),
            })?;
        debug!(
            "Binding '{}' -> '{}' ({}) with strategy '{}'",
            source.name(),
            target.name(),
            directive.capability,
            strategy.name()
        );

        let context = BindingContext::new(source, target, directive, access);
        let result = strategy.bind(&context).await?;

        info!(
            "Bound '{}' to '{}' {} with {} access ({} env vars, {} statements, {} network rules)",
            source.name(),
            target.name(),
            directive.capability,
            access.as_str(),
            result.environment_variables.len(),
            result.access_policies.len(),
            result.network_rules.len()
        );
        Ok(result)
    }

    /// Send the accumulated network rules and grants of `source` to its scope.
    pub async fn wire(&self, source: &Component) -> BinderResult<()> {
        self.wire_all(&[source]).await
    }

    /// Wire several components: every network rule first, then every grant,
    /// so a refused connection leaves no grant behind.
    pub async fn wire_all(&self, components: &[&Component]) -> BinderResult<()> {
        for component in components {
            for rule in &component.binding().network_rules {
                component.context().scope.allow_connection(rule.clone()).await?;
            }
        }
        for component in components {
            self.grant(component).await?;
        }
        Ok(())
    }

    async fn grant(&self, source: &Component) -> BinderResult<()> {
        let binding = source.binding();
        if binding.access_policies.is_empty() {
            return Ok(());
        }

        let role = match source.construct("role") {
            Ok(role) => role,
            Err(CoreError::ConstructNotFound { .. }) => {
                debug!(
                    "'{}' has no role construct; leaving {} grants to the deployment artifact",
                    source.name(),
                    binding.access_policies.len()
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for statement in &binding.access_policies {
            source
                .context()
                .scope
                .grant(GrantRequest {
                    principal: role.id.clone(),
                    actions: statement.actions.clone(),
                    resources: statement.resources.clone(),
                })
                .await?;
        }
        debug!(
            "Granted {} statements to '{}'",
            binding.access_policies.len(),
            source.name()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use kiln_config::ComplianceFramework;
    use kiln_core::{
        ComponentContext, ComponentSpec, CoreResult, GrantRequest, NetworkRule,
        ProvisionedResource, Provisioner, ResourceRequest,
    };
    use mockall::{mock, Sequence};

    use crate::test_support::Fixture;
    use kiln_components::{builtin_registry, InMemoryProvisioner};

    mock! {
        pub Scope {}

        #[async_trait]
        impl Provisioner for Scope {
            async fn provision(&self, request: ResourceRequest) -> CoreResult<ProvisionedResource>;
            async fn grant(&self, grant: GrantRequest) -> CoreResult<()>;
            async fn allow_connection(&self, rule: NetworkRule) -> CoreResult<()>;
        }
    }

    #[tokio::test]
    async fn test_queue_read_maps_to_exact_actions() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let registry = BinderRegistry::with_builtin_strategies();
        let directive = BindingDirective::to("jobs", "queue:sqs", "read");

        let result = ComponentBinder::new(&registry)
            .bind(&fixture.api, &fixture.queue, &directive)
            .await
            .unwrap();

        assert_eq!(
            result.actions(),
            vec![
                "sqs:DeleteMessage",
                "sqs:GetQueueAttributes",
                "sqs:GetQueueUrl",
                "sqs:ReceiveMessage"
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_access_level() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let registry = BinderRegistry::with_builtin_strategies();
        let directive = BindingDirective::to("jobs", "queue:sqs", "owner");

        let err = ComponentBinder::new(&registry)
            .bind(&fixture.api, &fixture.queue, &directive)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BinderError::Core(CoreError::UnsupportedAccessLevel(ref level)) if level == "owner"
        ));
    }

    #[tokio::test]
    async fn test_no_strategy_lists_registered_pairs() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let registry = BinderRegistry::with_builtin_strategies();
        let directive = BindingDirective::to("orders-db", "db:postgres", "read");

        let err = ComponentBinder::new(&registry)
            .bind(&fixture.queue, &fixture.database, &directive)
            .await
            .unwrap_err();

        match err {
            BinderError::NoBinderStrategy {
                source_type,
                capability,
                registered,
            } => {
                assert_eq!(source_type, "sqs-queue");
                assert_eq!(capability, "db:postgres");
                assert_eq!(registered, registry.registered_pairs());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_capability_missing_on_target() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let registry = BinderRegistry::with_builtin_strategies();
        let directive = BindingDirective::to("assets", "queue:sqs", "read");

        let err = ComponentBinder::new(&registry)
            .bind(&fixture.api, &fixture.bucket, &directive)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BinderError::Core(CoreError::CapabilityMissing { ref target, ref capability })
                if target == "assets" && capability == "queue:sqs"
        ));
    }

    #[tokio::test]
    async fn test_unsynthesized_target_rejected() {
        let fixture = Fixture::new(ComplianceFramework::Baseline).await;
        let registry = BinderRegistry::with_builtin_strategies();
        let pending = builtin_registry()
            .unwrap()
            .create_component(
                &ComponentSpec::new("later", "sqs-queue"),
                fixture.api.context(),
            )
            .unwrap();
        let directive = BindingDirective::to("later", "queue:sqs", "read");

        let err = ComponentBinder::new(&registry)
            .bind(&fixture.api, &pending, &directive)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BinderError::Core(CoreError::NotSynthesized { ref component, .. }) if component == "later"
        ));
    }

    #[tokio::test]
    async fn test_grant_goes_to_source_role() {
        let backing = InMemoryProvisioner::default();
        let mut scope = MockScope::new();
        let materializer = backing.clone();
        scope
            .expect_provision()
            .returning(move |request| Ok(materializer.materialize(&request)));
        scope
            .expect_grant()
            .withf(|grant| {
                grant.principal.ends_with(":role/shop-dev-api-role")
                    && grant.actions == vec!["sqs:GetQueueAttributes", "sqs:GetQueueUrl", "sqs:SendMessage"]
            })
            .times(1)
            .returning(|_| Ok(()));
        scope.expect_allow_connection().never();

        let context = ComponentContext::new(
            "shop",
            "dev",
            ComplianceFramework::Baseline,
            Arc::new(scope),
        );
        let components = builtin_registry().unwrap();
        let mut api = components
            .create_component(&ComponentSpec::new("api", "lambda-api"), &context)
            .unwrap();
        let mut queue = components
            .create_component(&ComponentSpec::new("jobs", "sqs-queue"), &context)
            .unwrap();
        queue.synth().await.unwrap();
        api.synth().await.unwrap();

        let registry = BinderRegistry::with_builtin_strategies();
        let binder = ComponentBinder::new(&registry);
        let directive = BindingDirective::to("jobs", "queue:sqs", "write");
        let result = binder.bind(&api, &queue, &directive).await.unwrap();
        assert_eq!(result.access_policies.len(), 1);

        api.apply_binding(result).unwrap();
        binder.wire(&api).await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_alone_touches_nothing() {
        let backing = InMemoryProvisioner::default();
        let mut scope = MockScope::new();
        scope
            .expect_provision()
            .returning(move |request| Ok(backing.materialize(&request)));
        scope.expect_grant().never();
        scope.expect_allow_connection().never();

        let context = ComponentContext::new(
            "shop",
            "dev",
            ComplianceFramework::Baseline,
            Arc::new(scope),
        );
        let components = builtin_registry().unwrap();
        let mut api = components
            .create_component(&ComponentSpec::new("api", "lambda-api"), &context)
            .unwrap();
        let mut database = components
            .create_component(&ComponentSpec::new("orders-db", "rds-postgres"), &context)
            .unwrap();
        database.synth().await.unwrap();
        api.synth().await.unwrap();

        let registry = BinderRegistry::with_builtin_strategies();
        let result = ComponentBinder::new(&registry)
            .bind(&api, &database, &BindingDirective::to("orders-db", "db:postgres", "readwrite"))
            .await
            .unwrap();

        assert_eq!(result.access_policies.len(), 2);
        assert_eq!(result.network_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_network_rules_are_opened_before_grants() {
        let backing = InMemoryProvisioner::default();
        let mut scope = MockScope::new();
        let mut sequence = Sequence::new();
        scope
            .expect_provision()
            .returning(move |request| Ok(backing.materialize(&request)));
        scope
            .expect_allow_connection()
            .withf(|rule| rule.port == 5432)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        scope
            .expect_grant()
            .times(2)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let context = ComponentContext::new(
            "shop",
            "dev",
            ComplianceFramework::Baseline,
            Arc::new(scope),
        );
        let components = builtin_registry().unwrap();
        let mut api = components
            .create_component(&ComponentSpec::new("api", "lambda-api"), &context)
            .unwrap();
        let mut database = components
            .create_component(&ComponentSpec::new("orders-db", "rds-postgres"), &context)
            .unwrap();
        database.synth().await.unwrap();
        api.synth().await.unwrap();

        let registry = BinderRegistry::with_builtin_strategies();
        let binder = ComponentBinder::new(&registry);
        let result = binder
            .bind(&api, &database, &BindingDirective::to("orders-db", "db:postgres", "readwrite"))
            .await
            .unwrap();
        api.apply_binding(result).unwrap();

        binder.wire_all(&[&api, &database]).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_grant_fails_the_wiring() {
        let backing = InMemoryProvisioner::default();
        let mut scope = MockScope::new();
        scope
            .expect_provision()
            .returning(move |request| Ok(backing.materialize(&request)));
        scope.expect_grant().returning(|grant| {
            Err(CoreError::Provisioning {
                component: grant.principal,
                message: "access denied".to_string(),
            })
        });

        let context = ComponentContext::new(
            "shop",
            "dev",
            ComplianceFramework::Baseline,
            Arc::new(scope),
        );
        let components = builtin_registry().unwrap();
        let mut api = components
            .create_component(&ComponentSpec::new("api", "lambda-worker"), &context)
            .unwrap();
        let mut bucket = components
            .create_component(&ComponentSpec::new("assets", "s3-bucket"), &context)
            .unwrap();
        bucket.synth().await.unwrap();
        api.synth().await.unwrap();

        let registry = BinderRegistry::with_builtin_strategies();
        let binder = ComponentBinder::new(&registry);
        let result = binder
            .bind(&api, &bucket, &BindingDirective::to("assets", "bucket:s3", "read"))
            .await
            .unwrap();
        api.apply_binding(result).unwrap();
        let err = binder.wire(&api).await.unwrap_err();

        assert!(matches!(err, BinderError::Core(CoreError::Provisioning { .. })));
    }
}
