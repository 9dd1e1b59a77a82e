//! Capability contracts: the stable seam between producers and binders.
//!
//! A producer may represent its resources however it likes internally, but
//! every capability it publishes must carry the fields its contract names.
//! Contracts are checked on both sides of the seam: when synthesis returns and
//! when a binder reads the capability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

pub const DB_POSTGRES: &str = "db:postgres";
pub const DB_DYNAMODB: &str = "db:dynamodb";
pub const QUEUE_SQS: &str = "queue:sqs";
pub const BUCKET_S3: &str = "bucket:s3";
pub const API_REST: &str = "api:rest";

/// A named contract published by a synthesized component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub key: String,
    pub fields: BTreeMap<String, Value>,
}

impl Capability {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String rendering of a field; numbers and booleans are stringified.
    pub fn field_string(&self, name: &str) -> CoreResult<String> {
        match self.fields.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            _ => Err(CoreError::CapabilityContract {
                capability: self.key.clone(),
                message: format!("field '{}' is missing or not a scalar", name),
            }),
        }
    }
}

/// Required field set for one capability key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityContract {
    pub key: &'static str,
    pub required_fields: &'static [&'static str],
}

impl CapabilityContract {
    pub fn validate(&self, capability: &Capability) -> CoreResult<()> {
        for field in self.required_fields {
            match capability.fields.get(*field) {
                Some(Value::String(_)) | Some(Value::Number(_)) | Some(Value::Bool(_)) => {}
                Some(_) => {
                    return Err(CoreError::CapabilityContract {
                        capability: capability.key.clone(),
                        message: format!("field '{}' must be a scalar", field),
                    });
                }
                None => {
                    return Err(CoreError::CapabilityContract {
                        capability: capability.key.clone(),
                        message: format!("missing required field '{}'", field),
                    });
                }
            }
        }
        Ok(())
    }
}

const BUILTIN_CONTRACTS: &[CapabilityContract] = &[
    CapabilityContract {
        key: DB_POSTGRES,
        required_fields: &[
            "host",
            "port",
            "dbName",
            "secretArn",
            "securityGroupId",
            "instanceArn",
        ],
    },
    CapabilityContract {
        key: DB_DYNAMODB,
        required_fields: &["tableName", "tableArn"],
    },
    CapabilityContract {
        key: QUEUE_SQS,
        required_fields: &["queueUrl", "queueArn", "queueName"],
    },
    CapabilityContract {
        key: BUCKET_S3,
        required_fields: &["bucketName", "bucketArn"],
    },
    CapabilityContract {
        key: API_REST,
        required_fields: &["url", "functionArn"],
    },
];

/// Lookup of the built-in capability contracts.
pub struct CapabilityContracts;

impl CapabilityContracts {
    pub fn all() -> &'static [CapabilityContract] {
        BUILTIN_CONTRACTS
    }

    pub fn get(key: &str) -> Option<&'static CapabilityContract> {
        BUILTIN_CONTRACTS.iter().find(|c| c.key == key)
    }

    /// Validate against the contract for the capability's key. Keys without a
    /// built-in contract only need non-null fields.
    pub fn validate(capability: &Capability) -> CoreResult<()> {
        if let Some(contract) = Self::get(&capability.key) {
            contract.validate(capability)?;
        }
        if let Some((name, _)) = capability.fields.iter().find(|(_, v)| v.is_null()) {
            return Err(CoreError::CapabilityContract {
                capability: capability.key.clone(),
                message: format!("field '{}' is null", name),
            });
        }
        Ok(())
    }
}
