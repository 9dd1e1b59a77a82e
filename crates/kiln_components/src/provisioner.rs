//! Deterministic in-memory provisioner.
//!
//! Stands in for the real resource-construction layer. Identifiers are derived
//! from the region, account and physical resource names, so identical inputs
//! always produce identical outputs. Every call is captured for verification.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::debug;

use kiln_core::{
    ConstructHandle, CoreError, CoreResult, GrantRequest, NetworkRule, ProvisionedResource,
    Provisioner, ResourceRequest,
};

pub const SQS_QUEUE: &str = "AWS::SQS::Queue";
pub const RDS_INSTANCE: &str = "AWS::RDS::DBInstance";
pub const SECRET: &str = "AWS::SecretsManager::Secret";
pub const SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";
pub const S3_BUCKET: &str = "AWS::S3::Bucket";
pub const DYNAMODB_TABLE: &str = "AWS::DynamoDB::Table";
pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const KMS_KEY: &str = "AWS::KMS::Key";

/// FNV-1a, used to derive stable short identifiers.
fn short_hash(input: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", hash)[..8].to_string()
}

/// In-memory implementation of [`Provisioner`].
///
/// Provisioning the same `(component, logical_id)` twice returns the
/// resource recorded the first time.
#[derive(Clone)]
pub struct InMemoryProvisioner {
    region: String,
    account: String,
    resources: Arc<RwLock<BTreeMap<(String, String), ProvisionedResource>>>,
    requests: Arc<RwLock<Vec<ResourceRequest>>>,
    grants: Arc<RwLock<Vec<GrantRequest>>>,
    connections: Arc<RwLock<Vec<NetworkRule>>>,
    failing_types: Arc<RwLock<Vec<String>>>,
}

impl InMemoryProvisioner {
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: account.into(),
            resources: Arc::new(RwLock::new(BTreeMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            grants: Arc::new(RwLock::new(Vec::new())),
            connections: Arc::new(RwLock::new(Vec::new())),
            failing_types: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make every request for `resource_type` fail.
    pub fn fail_on(&self, resource_type: impl Into<String>) {
        self.failing_types.write().push(resource_type.into());
    }

    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.read().clone()
    }

    pub fn grants(&self) -> Vec<GrantRequest> {
        self.grants.read().clone()
    }

    pub fn connections(&self) -> Vec<NetworkRule> {
        self.connections.read().clone()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.read().len()
    }

    /// Whether nothing at all has been asked of this provisioner.
    pub fn is_untouched(&self) -> bool {
        self.requests.read().is_empty()
            && self.grants.read().is_empty()
            && self.connections.read().is_empty()
    }

    /// Compute the resource a request would produce, without recording it.
    pub fn materialize(&self, request: &ResourceRequest) -> ProvisionedResource {
        let name = request
            .properties
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("{}-{}", request.component, request.logical_id));
        let region = &self.region;
        let account = &self.account;

        let (id, outputs) = match request.resource_type.as_str() {
            SQS_QUEUE => {
                let url = format!("https://sqs.{}.amazonaws.com/{}/{}", region, account, name);
                let arn = format!("arn:aws:sqs:{}:{}:{}", region, account, name);
                (url.clone(), json!({"url": url, "arn": arn, "name": name}))
            }
            RDS_INSTANCE => {
                let port = request
                    .properties
                    .get("port")
                    .and_then(Value::as_u64)
                    .unwrap_or(5432);
                let endpoint = format!(
                    "{}.{}.{}.rds.amazonaws.com",
                    name,
                    short_hash(&format!("{}{}", account, region)),
                    region
                );
                let arn = format!("arn:aws:rds:{}:{}:db:{}", region, account, name);
                (
                    name.clone(),
                    json!({"arn": arn, "endpoint": endpoint, "port": port, "name": name}),
                )
            }
            SECRET => {
                let arn = format!(
                    "arn:aws:secretsmanager:{}:{}:secret:{}-{}",
                    region,
                    account,
                    name,
                    short_hash(&name)
                );
                (arn.clone(), json!({"arn": arn, "name": name}))
            }
            SECURITY_GROUP => {
                let id = format!("sg-{}", short_hash(&format!("{}/{}", account, name)));
                (id.clone(), json!({"id": id, "name": name}))
            }
            S3_BUCKET => {
                let arn = format!("arn:aws:s3:::{}", name);
                (name.clone(), json!({"arn": arn, "name": name}))
            }
            DYNAMODB_TABLE => {
                let arn = format!("arn:aws:dynamodb:{}:{}:table/{}", region, account, name);
                (name.clone(), json!({"arn": arn, "name": name}))
            }
            LAMBDA_FUNCTION => {
                let arn = format!("arn:aws:lambda:{}:{}:function:{}", region, account, name);
                let url = format!(
                    "https://{}.lambda-url.{}.on.aws/",
                    short_hash(&arn),
                    region
                );
                (arn.clone(), json!({"arn": arn, "url": url, "name": name}))
            }
            IAM_ROLE => {
                let arn = format!("arn:aws:iam::{}:role/{}", account, name);
                (arn.clone(), json!({"arn": arn, "name": name}))
            }
            KMS_KEY => {
                let arn = format!(
                    "arn:aws:kms:{}:{}:key/{}",
                    region,
                    account,
                    short_hash(&name)
                );
                (arn.clone(), json!({"arn": arn}))
            }
            other => {
                let arn = format!("arn:kiln:{}:{}:{}/{}", region, account, other, name);
                (arn.clone(), json!({"arn": arn, "name": name}))
            }
        };

        let outputs: BTreeMap<String, Value> = match outputs {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        let mut handle = ConstructHandle::new(id, &request.resource_type);
        for (key, value) in &outputs {
            if let Some(s) = value.as_str() {
                handle = handle.with_attribute(key, s);
            }
        }

        ProvisionedResource { handle, outputs }
    }
}

impl Default for InMemoryProvisioner {
    fn default() -> Self {
        Self::new("us-east-1", "000000000000")
    }
}

impl std::fmt::Debug for InMemoryProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProvisioner")
            .field("region", &self.region)
            .field("account", &self.account)
            .field("resources", &self.resources.read().len())
            .finish()
    }
}

#[async_trait]
impl Provisioner for InMemoryProvisioner {
    async fn provision(&self, request: ResourceRequest) -> CoreResult<ProvisionedResource> {
        self.requests.write().push(request.clone());

        if self.failing_types.read().contains(&request.resource_type) {
            return Err(CoreError::Provisioning {
                component: request.component,
                message: format!("simulated failure for {}", request.resource_type),
            });
        }

        let key = (request.component.clone(), request.logical_id.clone());
        let mut resources = self.resources.write();
        let resource = resources.entry(key).or_insert_with(|| {
            let resource = self.materialize(&request);
            debug!(
                "Provisioned {} '{}/{}' as {}",
                request.resource_type, request.component, request.logical_id, resource.handle.id
            );
            resource
        });
        Ok(resource.clone())
    }

    async fn grant(&self, grant: GrantRequest) -> CoreResult<()> {
        debug!("Granting {:?} to {}", grant.actions, grant.principal);
        self.grants.write().push(grant);
        Ok(())
    }

    async fn allow_connection(&self, rule: NetworkRule) -> CoreResult<()> {
        debug!(
            "Allowing {} -> {} on port {}",
            rule.source_group, rule.target_group, rule.port
        );
        self.connections.write().push(rule);
        Ok(())
    }
}
