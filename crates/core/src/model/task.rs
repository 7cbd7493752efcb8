use thiserror::Error;

use crate::model::ids::TaskId;
use crate::model::schema::TableName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("exercise order must be 1-based")]
    InvalidNumber,
}

/// One graded SQL question within a lesson.
///
/// The task number is the 1-based exercise order and defines the task's
/// position in the lesson. `completed` is monotonic: once set it is never
/// cleared again.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseTask {
    id: TaskId,
    number: u32,
    description: String,
    initial_query: String,
    completed: bool,
    preview_allowed: bool,
    large_query: bool,
    tables: Option<Vec<TableName>>,
}

impl ExerciseTask {
    /// Create a task with default flags (not completed, preview allowed,
    /// regular editor size, no table override).
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidNumber` if `number` is zero.
    pub fn new(
        id: TaskId,
        number: u32,
        description: impl Into<String>,
        initial_query: impl Into<String>,
    ) -> Result<Self, TaskError> {
        if number == 0 {
            return Err(TaskError::InvalidNumber);
        }
        Ok(Self {
            id,
            number,
            description: description.into(),
            initial_query: initial_query.into(),
            completed: false,
            preview_allowed: true,
            large_query: false,
            tables: None,
        })
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_preview_allowed(mut self, preview_allowed: bool) -> Self {
        self.preview_allowed = preview_allowed;
        self
    }

    #[must_use]
    pub fn with_large_query(mut self, large_query: bool) -> Self {
        self.large_query = large_query;
        self
    }

    /// Narrow the schema visible to this task to the given tables.
    #[must_use]
    pub fn with_tables(mut self, tables: Vec<TableName>) -> Self {
        self.tables = Some(tables);
        self
    }

    #[must_use]
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// 1-based exercise order.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn initial_query(&self) -> &str {
        &self.initial_query
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn preview_allowed(&self) -> bool {
        self.preview_allowed
    }

    /// Editor layout hint for tasks with long starter queries.
    #[must_use]
    pub fn large_query(&self) -> bool {
        self.large_query
    }

    /// Task-scoped table override, if any.
    #[must_use]
    pub fn tables(&self) -> Option<&[TableName]> {
        self.tables.as_deref()
    }

    /// Mark the task completed. One-way: completion is never reversed.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}
