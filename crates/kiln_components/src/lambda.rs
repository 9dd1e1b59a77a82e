//! `lambda-api` and `lambda-worker`: compute components that consume capabilities.
//!
//! Both register `function`, `role` and `securityGroup` constructs so binders
//! can attach permissions and open network paths. Only the API flavor
//! publishes a capability of its own.

use async_trait::async_trait;
use serde_json::{json, Value};

use kiln_config::{ComplianceFramework, ConfigProfile, RetentionFloor};
use kiln_core::capability::API_REST;
use kiln_core::{Capability, Component, ComponentCreator, CoreResult, Synthesis};

use crate::common::{logging_schema, monitoring_schema, provision, required_output};
use crate::provisioner::{IAM_ROLE, LAMBDA_FUNCTION, SECURITY_GROUP};

pub const API_COMPONENT_TYPE: &str = "lambda-api";
pub const WORKER_COMPONENT_TYPE: &str = "lambda-worker";

/// Which flavor of function a creator builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// HTTP-facing function behind a function URL.
    Api,
    /// Background function driven by event sources.
    Worker,
}

pub struct LambdaProfile {
    kind: FunctionKind,
}

impl ConfigProfile for LambdaProfile {
    fn fallback(&self) -> Value {
        let mut fallback = json!({
            "runtime": "nodejs20.x",
            "handler": "index.handler",
            "memorySize": 512,
            "timeoutSeconds": 30,
            "architecture": "arm64",
            "environment": {},
            "tracing": {"enabled": false},
            "logging": {"retentionDays": 30},
            "monitoring": {"enabled": false}
        });
        if self.kind == FunctionKind::Api {
            fallback["api"] = json!({"authType": "iam", "cors": {"allowedOrigins": []}});
        }
        fallback
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        json!({
            "tracing": {"enabled": posture.detailed_monitoring},
            "logging": {"retentionDays": posture.log_retention_days},
            "monitoring": {"enabled": posture.monitoring_required}
        })
    }

    fn environment_defaults(&self, environment: &str) -> Value {
        match environment {
            "prod" | "production" => json!({"memorySize": 1024, "monitoring": {"enabled": true}}),
            _ => Value::Null,
        }
    }

    fn schema(&self) -> Value {
        let mut schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "runtime": {"type": "string"},
                "handler": {"type": "string", "minLength": 1},
                "memorySize": {"type": "integer", "minimum": 128, "maximum": 10240},
                "timeoutSeconds": {"type": "integer", "minimum": 1, "maximum": 900},
                "architecture": {"enum": ["arm64", "x86_64"]},
                "reservedConcurrency": {"type": "integer", "minimum": 0},
                "environment": {
                    "type": "object",
                    "additionalProperties": {"type": "string"}
                },
                "tracing": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"enabled": {"type": "boolean"}}
                },
                "logging": logging_schema(),
                "monitoring": monitoring_schema(Value::Null)
            }
        });
        if self.kind == FunctionKind::Api {
            schema["properties"]["api"] = json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "authType": {"enum": ["iam", "none"]},
                    "cors": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "allowedOrigins": {"type": "array", "items": {"type": "string"}}
                        }
                    }
                }
            });
        }
        schema
    }

    fn retention_floors(&self, framework: ComplianceFramework) -> Vec<RetentionFloor> {
        vec![RetentionFloor::new(
            "/logging/retentionDays",
            framework.posture().log_retention_days,
        )]
    }
}

/// Creator for both function flavors.
pub struct LambdaFunctionCreator {
    kind: FunctionKind,
    profile: LambdaProfile,
}

impl LambdaFunctionCreator {
    pub fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            profile: LambdaProfile { kind },
        }
    }

    pub fn api() -> Self {
        Self::new(FunctionKind::Api)
    }

    pub fn worker() -> Self {
        Self::new(FunctionKind::Worker)
    }
}

#[async_trait]
impl ComponentCreator for LambdaFunctionCreator {
    fn component_type(&self) -> &str {
        match self.kind {
            FunctionKind::Api => API_COMPONENT_TYPE,
            FunctionKind::Worker => WORKER_COMPONENT_TYPE,
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            FunctionKind::Api => "Lambda function exposed through a function URL",
            FunctionKind::Worker => "Lambda function driven by event sources",
        }
    }

    fn profile(&self) -> &dyn ConfigProfile {
        &self.profile
    }

    fn capability_keys(&self) -> Vec<&'static str> {
        match self.kind {
            FunctionKind::Api => vec![API_REST],
            FunctionKind::Worker => Vec::new(),
        }
    }

    async fn synthesize(&self, component: &Component) -> CoreResult<Synthesis> {
        let config = component.config()?;
        let context = component.context();
        let name = context.resource_name(component.name());

        let role = provision(
            component,
            "role",
            IAM_ROLE,
            json!({
                "name": format!("{}-role", name),
                "assumedBy": "lambda.amazonaws.com"
            }),
        )
        .await?;

        let security_group = provision(
            component,
            "securityGroup",
            SECURITY_GROUP,
            json!({
                "name": format!("{}-fn", name),
                "vpcId": context.network.as_ref().map(|n| n.id.clone())
            }),
        )
        .await?;

        let function = provision(
            component,
            "function",
            LAMBDA_FUNCTION,
            json!({
                "name": name,
                "runtime": config.get_str("/runtime"),
                "handler": config.get_str("/handler"),
                "memorySize": config.get_u64("/memorySize"),
                "timeoutSeconds": config.get_u64("/timeoutSeconds"),
                "architecture": config.get_str("/architecture"),
                "roleArn": role.handle.id.clone(),
                "securityGroupIds": [security_group.handle.id.clone()],
                "tracing": config.get_bool("/tracing/enabled"),
                "functionUrl": self.kind == FunctionKind::Api
            }),
        )
        .await?;

        let mut synthesis = Synthesis::new();
        if self.kind == FunctionKind::Api {
            synthesis = synthesis.with_capability(
                Capability::new(API_REST)
                    .with_field("url", required_output(component, &function, "url")?)
                    .with_field("functionArn", required_output(component, &function, "arn")?),
            );
        }

        Ok(synthesis
            .with_construct("function", function.handle)
            .with_construct("role", role.handle)
            .with_construct("securityGroup", security_group.handle))
    }
}
