//! End-to-end binding of built-in components.

use std::sync::Arc;

use serde_json::json;

use kiln_binder::{BinderError, BinderRegistry, ComponentBinder};
use kiln_components::{builtin_registry, InMemoryProvisioner};
use kiln_config::ComplianceFramework;
use kiln_core::{
    BindingDirective, Component, ComponentContext, ComponentSpec, ComponentState, CoreError,
};

async fn synthesized(specs: &[ComponentSpec], context: &ComponentContext) -> Vec<Component> {
    let registry = builtin_registry().unwrap();
    let mut components = Vec::new();
    for spec in specs {
        let mut component = registry.create_component(spec, context).unwrap();
        component.synth().await.unwrap();
        components.push(component);
    }
    components
}

fn context(provisioner: &InMemoryProvisioner) -> ComponentContext {
    ComponentContext::new(
        "shop",
        "dev",
        ComplianceFramework::Moderate,
        Arc::new(provisioner.clone()),
    )
}

#[tokio::test]
async fn test_worker_bound_to_queue_and_table() {
    let provisioner = InMemoryProvisioner::default();
    let mut components = synthesized(
        &[
            ComponentSpec::new("jobs", "sqs-queue"),
            ComponentSpec::new("orders", "dynamodb-table"),
            ComponentSpec::new("indexer", "lambda-worker"),
        ],
        &context(&provisioner),
    )
    .await;
    let mut worker = components.pop().unwrap();
    let table = components.pop().unwrap();
    let queue = components.pop().unwrap();

    let registry = BinderRegistry::with_builtin_strategies();
    let binder = ComponentBinder::new(&registry);
    let consume = BindingDirective::to("jobs", "queue:sqs", "read")
        .with_options(json!({"eventSource": true}));
    let store = BindingDirective::to("orders", "db:dynamodb", "readwrite");

    let first = binder.bind(&worker, &queue, &consume).await.unwrap();
    let second = binder.bind(&worker, &table, &store).await.unwrap();
    worker.apply_binding(first).unwrap();
    worker.apply_binding(second).unwrap();

    assert_eq!(worker.state(), ComponentState::Bound);
    let binding = worker.binding();
    assert_eq!(
        binding.environment_variables.keys().collect::<Vec<_>>(),
        vec!["QUEUE_ARN", "QUEUE_URL", "TABLE_ARN", "TABLE_NAME"]
    );
    assert_eq!(binding.access_policies.len(), 2);
    assert_eq!(binding.additional_config["eventSources"]["jobs"]["batchSize"], 10);
    assert!(provisioner.grants().is_empty());

    binder.wire(&worker).await.unwrap();
    let grants = provisioner.grants();
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().all(|g| g.principal.ends_with(":role/shop-dev-indexer-role")));
}

#[tokio::test]
async fn test_two_queues_need_distinct_variable_names() {
    let provisioner = InMemoryProvisioner::default();
    let mut components = synthesized(
        &[
            ComponentSpec::new("jobs", "sqs-queue"),
            ComponentSpec::new("events", "sqs-queue"),
            ComponentSpec::new("api", "lambda-api"),
        ],
        &context(&provisioner),
    )
    .await;
    let mut api = components.pop().unwrap();
    let events = components.pop().unwrap();
    let jobs = components.pop().unwrap();

    let registry = BinderRegistry::with_builtin_strategies();
    let binder = ComponentBinder::new(&registry);

    let jobs_binding = binder
        .bind(&api, &jobs, &BindingDirective::to("jobs", "queue:sqs", "write"))
        .await
        .unwrap();
    let clashing = binder
        .bind(&api, &events, &BindingDirective::to("events", "queue:sqs", "write"))
        .await
        .unwrap();
    api.apply_binding(jobs_binding).unwrap();

    let err = api.apply_binding(clashing).unwrap_err();
    assert!(matches!(err, CoreError::EnvironmentVariableConflict { ref name, .. } if name == "QUEUE_ARN"));

    let prefixed = binder
        .bind(
            &api,
            &events,
            &BindingDirective::to("events", "queue:sqs", "write")
                .with_options(json!({"envPrefix": "EVENTS_"})),
        )
        .await
        .unwrap();
    api.apply_binding(prefixed).unwrap();
    assert!(api.binding().environment_variables.contains_key("EVENTS_QUEUE_URL"));
}

#[tokio::test]
async fn test_database_binding_opens_port() {
    let provisioner = InMemoryProvisioner::default();
    let mut components = synthesized(
        &[
            ComponentSpec::new("orders-db", "rds-postgres")
                .with_config(json!({"port": 6432, "dbName": "orders"})),
            ComponentSpec::new("api", "lambda-api"),
        ],
        &context(&provisioner),
    )
    .await;
    let mut api = components.pop().unwrap();
    let database = components.pop().unwrap();

    let registry = BinderRegistry::with_builtin_strategies();
    let binder = ComponentBinder::new(&registry);
    let result = binder
        .bind(&api, &database, &BindingDirective::to("orders-db", "db:postgres", "read"))
        .await
        .unwrap();

    assert_eq!(result.network_rules[0].port, 6432);
    assert_eq!(result.environment_variables["DB_NAME"], "orders");
    for statement in &result.access_policies {
        assert!(statement
            .conditions
            .iter()
            .any(|c| c.key == "kms:ViaService"));
    }

    api.apply_binding(result).unwrap();
    binder.wire(&api).await.unwrap();
    let connections = provisioner.connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].port, 6432);
    assert_eq!(provisioner.grants().len(), 2);
}

#[tokio::test]
async fn test_api_capability_has_no_builtin_consumer() {
    let provisioner = InMemoryProvisioner::default();
    let components = synthesized(
        &[
            ComponentSpec::new("api", "lambda-api"),
            ComponentSpec::new("indexer", "lambda-worker"),
        ],
        &context(&provisioner),
    )
    .await;

    let registry = BinderRegistry::with_builtin_strategies();
    let err = ComponentBinder::new(&registry)
        .bind(
            &components[1],
            &components[0],
            &BindingDirective::to("api", "api:rest", "read"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BinderError::NoBinderStrategy { .. }));
    assert!(err.to_string().contains("lambda-worker -> queue:sqs"));
}
