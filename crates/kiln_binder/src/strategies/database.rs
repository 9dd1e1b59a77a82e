//! Compute sources consuming `db:postgres`.

use async_trait::async_trait;
use tracing::warn;

use kiln_core::capability::DB_POSTGRES;
use kiln_core::{BindingResult, CoreError, NetworkRule, PolicyStatement};

use crate::actions::DATABASE_ACTIONS;
use crate::error::BinderResult;
use crate::strategy::{compute_sources, BinderStrategy, BindingContext};

/// Grants connect and credential access, and opens the database port from
/// the source's security group.
pub struct DatabaseBinderStrategy {
    sources: Vec<String>,
}

impl DatabaseBinderStrategy {
    pub fn new() -> Self {
        Self {
            sources: compute_sources(),
        }
    }

    pub fn with_sources(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

impl Default for DatabaseBinderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinderStrategy for DatabaseBinderStrategy {
    fn name(&self) -> &str {
        "database"
    }

    fn source_types(&self) -> &[String] {
        &self.sources
    }

    fn capability(&self) -> &str {
        DB_POSTGRES
    }

    async fn bind(&self, context: &BindingContext<'_>) -> BinderResult<BindingResult> {
        let db = context.capability(DB_POSTGRES)?;
        let port_field = db.field_string("port")?;
        let port: u16 = port_field.parse().map_err(|_| CoreError::CapabilityContract {
            capability: DB_POSTGRES.to_string(),
            message: format!("port '{}' is not a valid TCP port", port_field),
        })?;

        // Secret reads and instance access are scoped to their own resources.
        let (secret_actions, instance_actions): (Vec<String>, Vec<String>) = DATABASE_ACTIONS
            .actions(context.access)
            .into_iter()
            .partition(|action| action.starts_with("secretsmanager:"));

        let mut result = BindingResult::new();
        if !instance_actions.is_empty() {
            result = result.with_policy(
                PolicyStatement::allow(instance_actions, vec![db.field_string("instanceArn")?])
                    .with_conditions(context.hardening("rds")?),
            );
        }
        if !secret_actions.is_empty() {
            result = result.with_policy(
                PolicyStatement::allow(secret_actions, vec![db.field_string("secretArn")?])
                    .with_conditions(context.hardening("secretsmanager")?),
            );
        }

        result = context.export(result, db, "host", "DB_HOST")?;
        result = context.export(result, db, "port", "DB_PORT")?;
        result = context.export(result, db, "dbName", "DB_NAME")?;
        result = context.export(result, db, "secretArn", "DB_SECRET_ARN")?;

        match context.source_construct("securityGroup")? {
            Some(group) => {
                result = result.with_network_rule(NetworkRule::tcp(
                    group.id.clone(),
                    db.field_string("securityGroupId")?,
                    port,
                    format!("{} to {}", context.source.name(), context.target.name()),
                ));
            }
            None => warn!(
                "'{}' has no security group; no network path opened to '{}'",
                context.source.name(),
                context.target.name()
            ),
        }
        Ok(result)
    }
}
