//! Schema context resolution for the selected task.

use std::sync::Arc;

use gateway::{GatewayError, SchemaGateway};
use tutor_core::model::{ExerciseTask, Lesson, SqlContext, TableName, TableSchema};

/// Builds the [`SqlContext`] visible to one task.
///
/// A fresh context is assembled completely before the caller swaps it in;
/// a failed resolution never leaves a half-built mapping behind.
#[derive(Clone)]
pub struct ContextResolver {
    schema: Arc<dyn SchemaGateway>,
}

impl ContextResolver {
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaGateway>) -> Self {
        Self { schema }
    }

    /// The effective table set for a task: the task override when present,
    /// else the lesson default. An empty set is valid and yields an empty
    /// context.
    #[must_use]
    pub fn effective_tables(lesson: &Lesson, task: &ExerciseTask) -> Vec<TableName> {
        match task.tables() {
            Some(tables) => tables.to_vec(),
            None => lesson.tables().to_vec(),
        }
    }

    /// Fetch column metadata for every named table and assemble a context.
    ///
    /// # Errors
    ///
    /// Returns the first failing metadata fetch.
    pub async fn resolve(&self, names: &[TableName]) -> Result<SqlContext, GatewayError> {
        let mut tables: Vec<TableSchema> = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.schema.get_table_meta(name).await?);
        }
        Ok(SqlContext::new(tables))
    }
}
