//! Boundary to the external resource-construction layer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::NetworkRule;
use crate::construct::ConstructHandle;
use crate::error::CoreResult;

/// Request to materialize one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    /// Owning component name.
    pub component: String,
    /// Resource name, unique within the component (`queue`, `instance`, ...).
    pub logical_id: String,
    /// Provider resource type, e.g. `AWS::SQS::Queue`.
    pub resource_type: String,
    pub properties: Value,
}

impl ResourceRequest {
    pub fn new(
        component: impl Into<String>,
        logical_id: impl Into<String>,
        resource_type: impl Into<String>,
        properties: Value,
    ) -> Self {
        Self {
            component: component.into(),
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            properties,
        }
    }
}

/// Deploy-time identifiers returned for a provisioned resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedResource {
    pub handle: ConstructHandle,
    pub outputs: BTreeMap<String, Value>,
}

impl ProvisionedResource {
    pub fn output_str(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).and_then(Value::as_str)
    }
}

/// Grant-style permission attachment against a provisioned principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub principal: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// The resource-construction layer components synthesize through.
///
/// Identifiers only exist once `provision` returns; nothing in the core may
/// assume them earlier.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Materialize a resource and return its handle and outputs.
    async fn provision(&self, request: ResourceRequest) -> CoreResult<ProvisionedResource>;

    /// Attach permissions directly to a provisioned principal.
    async fn grant(&self, grant: GrantRequest) -> CoreResult<()>;

    /// Open a connection between two provisioned security groups.
    async fn allow_connection(&self, rule: NetworkRule) -> CoreResult<()>;
}
