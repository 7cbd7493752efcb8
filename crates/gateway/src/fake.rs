use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tutor_core::model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonId, PreviewTable, TableName,
    TableSchema, TaskId,
};

use crate::contract::{AnswerGateway, GatewayError, LessonGateway, QueryGateway, SchemaGateway};

/// In-memory stand-in for the lesson service. Clones share state, so a test
/// can keep one handle for seeding and hand another to the session.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    catalog: Vec<CatalogEntry>,
    lessons: HashMap<LessonId, Lesson>,
    schemas: HashMap<String, TableSchema>,
    table_rows: HashMap<String, PreviewTable>,
    answers: HashMap<(LessonId, TaskId), String>,
    expected: HashMap<(LessonId, TaskId), String>,
    explanations: HashMap<(LessonId, TaskId), String>,
    previews: HashMap<String, PreviewTable>,
    rejections: HashMap<String, String>,
    next_lessons: HashMap<LessonId, LessonId>,
    preview_queries: Vec<String>,
    timer_active: bool,
    offline: bool,
}

/// Collapse whitespace and case so seeded queries match what a user would
/// plausibly type.
fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn offline_error() -> GatewayError {
    GatewayError::Connection("offline".to_string())
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_catalog_entry(&self, entry: CatalogEntry) {
        self.state().catalog.push(entry);
    }

    pub fn seed_lesson(&self, lesson: Lesson) {
        self.state().lessons.insert(lesson.id().clone(), lesson);
    }

    pub fn seed_table(&self, schema: TableSchema) {
        self.state()
            .schemas
            .insert(schema.name().as_str().to_string(), schema);
    }

    /// Contents served for the table by `get_table_rows`.
    pub fn seed_table_rows(&self, name: &TableName, table: PreviewTable) {
        self.state()
            .table_rows
            .insert(name.as_str().to_string(), table);
    }

    pub fn seed_answer(&self, lesson: &LessonId, task: &TaskId, sql: impl Into<String>) {
        self.state()
            .answers
            .insert((lesson.clone(), task.clone()), sql.into());
    }

    /// Queries evaluating equal to `sql` (ignoring case and whitespace) are
    /// graded as matches for the task.
    pub fn seed_expected_query(&self, lesson: &LessonId, task: &TaskId, sql: &str) {
        self.state()
            .expected
            .insert((lesson.clone(), task.clone()), normalize(sql));
    }

    /// Explanation attached to mismatched submissions for the task.
    pub fn seed_explanation(&self, lesson: &LessonId, task: &TaskId, message: impl Into<String>) {
        self.state()
            .explanations
            .insert((lesson.clone(), task.clone()), message.into());
    }

    pub fn seed_preview(&self, query: &str, table: PreviewTable) {
        self.state().previews.insert(normalize(query), table);
    }

    pub fn seed_rejection(&self, query: &str, message: impl Into<String>) {
        self.state().rejections.insert(normalize(query), message.into());
    }

    pub fn set_next_lesson(&self, from: &LessonId, to: &LessonId) {
        self.state().next_lessons.insert(from.clone(), to.clone());
    }

    pub fn set_timer_active(&self, active: bool) {
        self.state().timer_active = active;
    }

    /// While offline, every endpoint fails with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Every preview query dispatched so far, in dispatch order.
    #[must_use]
    pub fn preview_queries(&self) -> Vec<String> {
        self.state().preview_queries.clone()
    }
}

#[async_trait]
impl LessonGateway for InMemoryGateway {
    async fn list_lessons(&self) -> Result<Vec<CatalogEntry>, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.catalog.clone())
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state.lessons.get(id).cloned().ok_or(GatewayError::NotFound)
    }

    async fn complete_lesson(&self, id: &LessonId) -> Result<(), GatewayError> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        for entry in &mut state.catalog {
            if entry.id() == id {
                *entry = entry.clone().with_completed(true);
            }
        }
        Ok(())
    }

    async fn next_lesson(&self, id: &LessonId) -> Result<Option<LessonId>, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.next_lessons.get(id).cloned())
    }
}

#[async_trait]
impl SchemaGateway for InMemoryGateway {
    async fn get_table_meta(&self, name: &TableName) -> Result<TableSchema, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state
            .schemas
            .get(name.as_str())
            .cloned()
            .ok_or(GatewayError::NotFound)
    }

    async fn get_table_rows(&self, name: &TableName) -> Result<PreviewTable, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state
            .table_rows
            .get(name.as_str())
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}

#[async_trait]
impl QueryGateway for InMemoryGateway {
    async fn preview(
        &self,
        _lesson: &LessonId,
        _task: &TaskId,
        query: &str,
    ) -> Result<PreviewTable, GatewayError> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        state.preview_queries.push(query.to_string());
        let key = normalize(query);
        if let Some(message) = state.rejections.get(&key) {
            return Err(GatewayError::Rejected(message.clone()));
        }
        Ok(state.previews.get(&key).cloned().unwrap_or_default())
    }

    async fn evaluate(
        &self,
        lesson: &LessonId,
        task: &ExerciseTask,
        query: &str,
    ) -> Result<Evaluation, GatewayError> {
        let mut state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        let key = (lesson.clone(), task.id().clone());
        let matched = state
            .expected
            .get(&key)
            .is_some_and(|expected| *expected == normalize(query));
        if !matched {
            let explanation = state.explanations.get(&key).cloned().unwrap_or_default();
            return Ok(Evaluation::new(false, explanation));
        }
        // Mirror the server: a graded match flips the stored completion flag.
        if let Some(stored) = state.lessons.get_mut(lesson) {
            let number = stored
                .tasks()
                .iter()
                .find(|t| t.id() == task.id())
                .map(ExerciseTask::number);
            if let Some(number) = number {
                let _ = stored.complete_task(number);
            }
        }
        Ok(Evaluation::new(true, ""))
    }
}

#[async_trait]
impl AnswerGateway for InMemoryGateway {
    async fn reveal_answer(
        &self,
        lesson: &LessonId,
        task: &TaskId,
    ) -> Result<String, GatewayError> {
        let state = self.state();
        if state.offline {
            return Err(offline_error());
        }
        if state.timer_active {
            return Err(GatewayError::PermissionDenied);
        }
        state
            .answers
            .get(&(lesson.clone(), task.clone()))
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}
