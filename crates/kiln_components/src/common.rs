//! Pieces shared by the built-in creators.

use serde_json::{json, Value};

use kiln_core::{Component, ConstructHandle, CoreError, CoreResult, ProvisionedResource, ResourceRequest};

use crate::provisioner::KMS_KEY;

/// Provision one resource for `component` through its context's scope.
pub(crate) async fn provision(
    component: &Component,
    logical_id: &str,
    resource_type: &str,
    properties: Value,
) -> CoreResult<ProvisionedResource> {
    component
        .context()
        .scope
        .provision(ResourceRequest::new(
            component.name(),
            logical_id,
            resource_type,
            properties,
        ))
        .await
}

/// An output the provisioner must have returned.
pub(crate) fn required_output(
    component: &Component,
    resource: &ProvisionedResource,
    name: &str,
) -> CoreResult<Value> {
    resource
        .outputs
        .get(name)
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| CoreError::Provisioning {
            component: component.name().to_string(),
            message: format!(
                "{} '{}' returned no '{}' output",
                resource.handle.kind, resource.handle.id, name
            ),
        })
}

/// Provision a customer-managed key when the resolved config asks for one.
pub(crate) async fn encryption_key(component: &Component) -> CoreResult<Option<ConstructHandle>> {
    let wants_key = component
        .config()?
        .get_bool("/encryption/customerManagedKey")
        .unwrap_or(false);
    if !wants_key {
        return Ok(None);
    }

    let name = component.context().resource_name(component.name());
    let key = provision(
        component,
        "encryptionKey",
        KMS_KEY,
        json!({"name": format!("{}-key", name), "enableKeyRotation": true}),
    )
    .await?;
    Ok(Some(key.handle))
}

/// Schema for the `encryption` block every data component carries.
pub(crate) fn encryption_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "customerManagedKey": {"type": "boolean"}
        }
    })
}

/// Schema for a `monitoring` block with optional extra properties.
pub(crate) fn monitoring_schema(extra: Value) -> Value {
    let mut properties = json!({"enabled": {"type": "boolean"}});
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        target.extend(extra);
    }
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties
    })
}

/// Schema for a `logging` block.
pub(crate) fn logging_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "retentionDays": {"type": "integer", "minimum": 1}
        }
    })
}
