//! Opaque handles to provisioned resource objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reference to a provisioned resource, registered on a component by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructHandle {
    /// Provider-assigned identifier (queue URL, instance id, ARN, ...).
    pub id: String,
    /// Resource kind, e.g. `AWS::SQS::Queue`.
    pub kind: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ConstructHandle {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }
}
