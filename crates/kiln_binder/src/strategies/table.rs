//! Compute sources consuming `db:dynamodb`.

use async_trait::async_trait;

use kiln_core::capability::DB_DYNAMODB;
use kiln_core::{BindingResult, PolicyStatement};

use crate::actions::TABLE_ACTIONS;
use crate::error::BinderResult;
use crate::strategy::{compute_sources, BinderStrategy, BindingContext};

/// Grants item access on the table and its secondary indexes.
pub struct TableBinderStrategy {
    sources: Vec<String>,
}

impl TableBinderStrategy {
    pub fn new() -> Self {
        Self {
            sources: compute_sources(),
        }
    }

    pub fn with_sources(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

impl Default for TableBinderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinderStrategy for TableBinderStrategy {
    fn name(&self) -> &str {
        "table"
    }

    fn source_types(&self) -> &[String] {
        &self.sources
    }

    fn capability(&self) -> &str {
        DB_DYNAMODB
    }

    async fn bind(&self, context: &BindingContext<'_>) -> BinderResult<BindingResult> {
        let table = context.capability(DB_DYNAMODB)?;
        let table_arn = table.field_string("tableArn")?;

        let statement = PolicyStatement::allow(
            TABLE_ACTIONS.actions(context.access),
            vec![table_arn.clone(), format!("{}/index/*", table_arn)],
        )
        .with_conditions(context.hardening("dynamodb")?);

        let mut result = BindingResult::new().with_policy(statement);
        result = context.export(result, table, "tableName", "TABLE_NAME")?;
        result = context.export(result, table, "tableArn", "TABLE_ARN")?;

        Ok(result)
    }
}
