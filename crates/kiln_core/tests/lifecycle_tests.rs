//! Registering a new component type and driving it through its lifecycle.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_config::{ComplianceFramework, ConfigProfile};
use kiln_core::{
    Capability, Component, ComponentContext, ComponentCreator, ComponentRegistry, ComponentSpec,
    ComponentState, ConstructHandle, CoreError, CoreResult, GrantRequest, NetworkRule,
    ProvisionedResource, Provisioner, ResourceRequest, Synthesis,
};

#[derive(Default)]
struct RecordingProvisioner {
    requests: Mutex<Vec<ResourceRequest>>,
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn provision(&self, request: ResourceRequest) -> CoreResult<ProvisionedResource> {
        let id = format!("{}-{}", request.component, request.logical_id);
        let endpoint = format!("{}.cache.local", id);
        self.requests.lock().unwrap().push(request);
        Ok(ProvisionedResource {
            handle: ConstructHandle::new(id, "AWS::ElastiCache::ReplicationGroup"),
            outputs: [("endpoint".to_string(), json!(endpoint))].into_iter().collect(),
        })
    }

    async fn grant(&self, _grant: GrantRequest) -> CoreResult<()> {
        Ok(())
    }

    async fn allow_connection(&self, _rule: NetworkRule) -> CoreResult<()> {
        Ok(())
    }
}

struct CacheProfile;

impl ConfigProfile for CacheProfile {
    fn fallback(&self) -> Value {
        json!({"nodeType": "cache.t3.micro", "nodes": 1, "encryption": {"inTransit": false}})
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        json!({"encryption": {"inTransit": framework.is_regulated()}})
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "nodeType": {"type": "string"},
                "nodes": {"type": "integer", "minimum": 1},
                "encryption": {
                    "type": "object",
                    "properties": {"inTransit": {"type": "boolean"}}
                }
            }
        })
    }
}

/// Publishes `cache:redis`, or whatever `publish` says for the error cases.
struct CacheCreator {
    publish: Capability,
}

impl CacheCreator {
    fn new() -> Self {
        Self {
            publish: Capability::new("cache:redis"),
        }
    }
}

#[async_trait]
impl ComponentCreator for CacheCreator {
    fn component_type(&self) -> &str {
        "redis-cache"
    }

    fn description(&self) -> &str {
        "Redis replication group"
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &CacheProfile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        vec!["cache:redis"]
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let context = component.context();
        let resource = context
            .scope
            .provision(ResourceRequest::new(
                component.name(),
                "cluster",
                "AWS::ElastiCache::ReplicationGroup",
                component.config()?.value().clone(),
            ))
            .await?;

        let mut capability = self.publish.clone();
        if capability.key == "cache:redis" {
            capability = capability.with_field(
                "endpoint",
                resource.output_str("endpoint").unwrap_or_default(),
            );
        }
        Ok(Synthesis::new()
            .with_capability(capability)
            .with_construct("cluster", resource.handle))
    }
}

fn context(provisioner: Arc<RecordingProvisioner>) -> ComponentContext {
    ComponentContext::new("shop", "dev", ComplianceFramework::High, provisioner)
}

#[tokio::test]
async fn test_custom_type_goes_through_every_state() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(CacheCreator::new())).unwrap();

    let spec = ComponentSpec::new("sessions", "redis-cache").with_config(json!({"nodes": 3}));
    let mut component = registry
        .create_component(&spec, &context(provisioner.clone()))
        .unwrap();

    assert_eq!(component.state(), ComponentState::Configured);
    assert_eq!(
        component.config().unwrap().value(),
        &json!({"nodeType": "cache.t3.micro", "nodes": 3, "encryption": {"inTransit": true}})
    );
    assert!(matches!(
        component.capability("cache:redis"),
        Err(CoreError::NotSynthesized { .. })
    ));

    component.synth().await.unwrap();

    assert_eq!(component.state(), ComponentState::Synthesized);
    assert_eq!(
        component.capability("cache:redis").unwrap().field("endpoint"),
        Some(&json!("sessions-cluster.cache.local"))
    );
    assert_eq!(component.construct_names().unwrap(), vec!["cluster"]);
    assert_eq!(provisioner.requests.lock().unwrap().len(), 1);

    let artifact = component.artifact().unwrap();
    assert_eq!(artifact.component_type, "redis-cache");
    assert_eq!(artifact.capabilities["cache:redis"]["endpoint"], "sessions-cluster.cache.local");
}

#[tokio::test]
async fn test_second_synthesis_is_rejected() {
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(CacheCreator::new())).unwrap();
    let provisioner = Arc::new(RecordingProvisioner::default());
    let mut component = registry
        .create_component(
            &ComponentSpec::new("sessions", "redis-cache"),
            &context(provisioner.clone()),
        )
        .unwrap();

    component.synth().await.unwrap();
    let err = component.synth().await.unwrap_err();

    assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    assert_eq!(provisioner.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unpublished_capability_breaks_the_contract() {
    let mut registry = ComponentRegistry::new();
    registry
        .register(Arc::new(CacheCreator {
            publish: Capability::new("queue:sqs").with_field("queueUrl", "x"),
        }))
        .unwrap();
    let mut component = registry
        .create_component(
            &ComponentSpec::new("sessions", "redis-cache"),
            &context(Arc::new(RecordingProvisioner::default())),
        )
        .unwrap();

    let err = component.synth().await.unwrap_err();

    assert!(matches!(err, CoreError::CapabilityContract { ref capability, .. } if capability == "queue:sqs"));
    assert_eq!(component.state(), ComponentState::Configured);
}

#[test]
fn test_schema_rejects_unknown_key() {
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(CacheCreator::new())).unwrap();

    let err = registry
        .create_component(
            &ComponentSpec::new("sessions", "redis-cache").with_config(json!({"shards": 2})),
            &context(Arc::new(RecordingProvisioner::default())),
        )
        .unwrap_err();

    assert!(matches!(err, CoreError::Config(_)));
}

#[test]
fn test_types_cannot_be_replaced() {
    let mut registry = ComponentRegistry::new();
    registry.register(Arc::new(CacheCreator::new())).unwrap();

    let err = registry.register(Arc::new(CacheCreator::new())).unwrap_err();

    assert!(matches!(err, CoreError::DuplicateComponentType(ref t) if t == "redis-cache"));
    assert_eq!(registry.len(), 1);
}
