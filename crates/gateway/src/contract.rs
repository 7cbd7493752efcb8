use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tutor_core::model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonId, PreviewTable, TableName,
    TableSchema, TaskId,
};
use url::Url;

use crate::fake::InMemoryGateway;
use crate::http::HttpGateway;

/// Errors surfaced by gateway adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    /// The server looked at the query and refused it. Carries the message
    /// intended for the user.
    #[error("query rejected: {0}")]
    Rejected(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Lesson catalog and progression endpoints.
#[async_trait]
pub trait LessonGateway: Send + Sync {
    /// Fetch the full catalog with per-lesson completion flags.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the catalog cannot be fetched or decoded.
    async fn list_lessons(&self) -> Result<Vec<CatalogEntry>, GatewayError>;

    /// Fetch one lesson with its ordered task list.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if missing, or other gateway errors.
    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, GatewayError>;

    /// Record the whole lesson as complete. Idempotent on the server side.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the server does not confirm the completion.
    async fn complete_lesson(&self, id: &LessonId) -> Result<(), GatewayError>;

    /// Ask which lesson follows `id` in the curriculum, if any.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the lookup fails.
    async fn next_lesson(&self, id: &LessonId) -> Result<Option<LessonId>, GatewayError>;
}

/// Table read endpoints backing the SQL context and the read-only source
/// table display.
#[async_trait]
pub trait SchemaGateway: Send + Sync {
    /// Fetch the ordered column list for one table.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the table metadata cannot be fetched.
    async fn get_table_meta(&self, name: &TableName) -> Result<TableSchema, GatewayError>;

    /// Fetch the contents of one table, row-limited by the server.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` when the table does not exist, or
    /// other gateway errors.
    async fn get_table_rows(&self, name: &TableName) -> Result<PreviewTable, GatewayError>;
}

/// Query execution endpoints: ungraded preview and graded evaluation.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Run the query read-only and return a result sample.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` when the server refuses the query,
    /// or other gateway errors.
    async fn preview(
        &self,
        lesson: &LessonId,
        task: &TaskId,
        query: &str,
    ) -> Result<PreviewTable, GatewayError>;

    /// Grade the query against the task's expected answer.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the evaluation cannot be performed. A wrong
    /// answer is not an error; it comes back as an unmatched `Evaluation`.
    async fn evaluate(
        &self,
        lesson: &LessonId,
        task: &ExerciseTask,
        query: &str,
    ) -> Result<Evaluation, GatewayError>;
}

/// Timer-gated access to stored task answers.
#[async_trait]
pub trait AnswerGateway: Send + Sync {
    /// Fetch the answer SQL for one task.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::PermissionDenied` while the attempt timer is
    /// active, `GatewayError::NotFound` when no answer is stored, or other
    /// gateway errors.
    async fn reveal_answer(&self, lesson: &LessonId, task: &TaskId)
    -> Result<String, GatewayError>;
}

/// Aggregates the lesson service endpoints behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Gateways {
    pub lessons: Arc<dyn LessonGateway>,
    pub schema: Arc<dyn SchemaGateway>,
    pub queries: Arc<dyn QueryGateway>,
    pub answers: Arc<dyn AnswerGateway>,
}

impl Gateways {
    /// Every endpoint served by one fresh in-memory fake.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_fake(InMemoryGateway::new())
    }

    /// Wrap an already seeded fake.
    #[must_use]
    pub fn from_fake(fake: InMemoryGateway) -> Self {
        let lessons: Arc<dyn LessonGateway> = Arc::new(fake.clone());
        let schema: Arc<dyn SchemaGateway> = Arc::new(fake.clone());
        let queries: Arc<dyn QueryGateway> = Arc::new(fake.clone());
        let answers: Arc<dyn AnswerGateway> = Arc::new(fake);
        Self {
            lessons,
            schema,
            queries,
            answers,
        }
    }

    /// Every endpoint served by the HTTP adapter rooted at `base`.
    #[must_use]
    pub fn http(base: Url) -> Self {
        let http = Arc::new(HttpGateway::new(base));
        Self {
            lessons: http.clone(),
            schema: http.clone(),
            queries: http.clone(),
            answers: http,
        }
    }
}
