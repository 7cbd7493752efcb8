use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutor_core::model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonId, PreviewTable, TableName,
    TableSchema, TaskId,
};

use crate::contract::GatewayError;

fn decode<E: core::fmt::Display>(e: E) -> GatewayError {
    GatewayError::Decode(e.to_string())
}

//
// ─── CATALOG LISTING ───────────────────────────────────────────────────────────
//

/// The listing arrives as a JSON object keyed by lesson id.
pub(crate) type CatalogListing = BTreeMap<String, CatalogEntryDto>;

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogEntryDto {
    title: Option<String>,
    subtitle: Option<String>,
    order: Option<u32>,
    completed: Option<bool>,
    difficulty: Option<String>,
}

pub(crate) fn catalog_from_listing(listing: CatalogListing) -> Vec<CatalogEntry> {
    listing
        .into_iter()
        .map(|(id, entry)| {
            CatalogEntry::new(
                LessonId::new(id),
                entry.title.unwrap_or_default(),
                entry.subtitle.unwrap_or_default(),
                entry.order.unwrap_or_default(),
                entry.completed.unwrap_or_default(),
                entry.difficulty.unwrap_or_default(),
            )
        })
        .collect()
}

//
// ─── LESSON DETAIL ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct LessonDetailDto {
    id: String,
    title: String,
    subtitle: Option<String>,
    #[serde(rename = "database-tables")]
    database_tables: Option<Vec<TableRefDto>>,
    #[serde(rename = "exercise-tasks")]
    exercise_tasks: Vec<TaskDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableRefDto {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskDto {
    /// Task ids are numbers like `1.2` on the wire; the textual form is the
    /// identity used in request paths.
    #[serde(rename = "task-id")]
    task_id: serde_json::Number,
    #[serde(rename = "exercise-order")]
    exercise_order: u32,
    description: Option<String>,
    #[serde(rename = "initial-query")]
    initial_query: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(rename = "preview-allowed")]
    preview_allowed: Option<bool>,
    #[serde(rename = "large-query")]
    large_query: Option<bool>,
    tables: Option<Vec<TableRefDto>>,
}

pub(crate) fn lesson_from_detail(detail: LessonDetailDto) -> Result<Lesson, GatewayError> {
    let mut tasks = Vec::with_capacity(detail.exercise_tasks.len());
    for dto in detail.exercise_tasks {
        tasks.push(task_from_dto(dto)?);
    }
    let tables = table_names(detail.database_tables.unwrap_or_default())?;
    Lesson::new(
        LessonId::new(detail.id),
        detail.title,
        detail.subtitle.unwrap_or_default(),
        tasks,
        tables,
    )
    .map_err(decode)
}

fn task_from_dto(dto: TaskDto) -> Result<ExerciseTask, GatewayError> {
    let task = ExerciseTask::new(
        TaskId::new(dto.task_id.to_string()),
        dto.exercise_order,
        dto.description.unwrap_or_default(),
        dto.initial_query.unwrap_or_default(),
    )
    .map_err(decode)?
    .with_completed(dto.completed)
    .with_preview_allowed(dto.preview_allowed.unwrap_or_default())
    .with_large_query(dto.large_query.unwrap_or_default());
    match dto.tables {
        Some(refs) => Ok(task.with_tables(table_names(refs)?)),
        None => Ok(task),
    }
}

fn table_names(refs: Vec<TableRefDto>) -> Result<Vec<TableName>, GatewayError> {
    refs.into_iter()
        .map(|r| TableName::new(r.name).map_err(decode))
        .collect()
}

//
// ─── TABLE METADATA ────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct TableMetaDto {
    name: String,
    columns: Vec<String>,
}

pub(crate) fn schema_from_meta(meta: TableMetaDto) -> Result<TableSchema, GatewayError> {
    let name = TableName::new(meta.name).map_err(decode)?;
    Ok(TableSchema::new(name, meta.columns))
}

//
// ─── PREVIEW ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct PreviewRequestDto<'a> {
    pub(crate) query: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewResponseDto {
    results: Option<PreviewResultsDto>,
    error: Option<String>,
}

impl PreviewResponseDto {
    /// Server-provided rejection text, when present.
    pub(crate) fn into_error_message(self) -> Option<String> {
        self.error
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewResultsDto {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<serde_json::Map<String, Value>>,
}

pub(crate) fn preview_from_response(
    response: PreviewResponseDto,
) -> Result<PreviewTable, GatewayError> {
    if let Some(error) = response.error {
        return Err(GatewayError::Rejected(error));
    }
    let results = response.results.ok_or_else(|| {
        GatewayError::Decode("preview response carried neither results nor error".into())
    })?;
    Ok(project_rows(results))
}

/// Rows arrive as objects keyed by column name; project them onto the
/// declared column order. Missing or null cells render empty.
fn project_rows(results: PreviewResultsDto) -> PreviewTable {
    let rows = results
        .rows
        .iter()
        .map(|row| {
            results
                .columns
                .iter()
                .map(|column| cell_text(row.get(column)))
                .collect()
        })
        .collect();
    PreviewTable::new(results.columns, rows)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateRequestDto<'a> {
    pub(crate) lesson_id: &'a str,
    pub(crate) task_number: &'a str,
    pub(crate) query: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateResponseDto {
    #[serde(rename = "resultsMatch")]
    results_match: bool,
    #[serde(rename = "userError")]
    user_error: Option<String>,
}

pub(crate) fn evaluation_from_response(response: EvaluateResponseDto) -> Evaluation {
    Evaluation::new(response.results_match, response.user_error.unwrap_or_default())
}

//
// ─── COMPLETION & NEXT LESSON ─────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionAckDto {
    status: Option<String>,
}

impl CompletionAckDto {
    pub(crate) fn confirms(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextLessonDto {
    next_lesson_id: Option<String>,
}

pub(crate) fn next_lesson_from_response(response: NextLessonDto) -> Option<LessonId> {
    response.next_lesson_id.map(LessonId::new)
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerDto {
    pub(crate) answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lesson_detail_maps_kebab_case_fields() {
        let detail: LessonDetailDto = serde_json::from_value(json!({
            "id": "lesson-1-basic-select",
            "title": "Basic SELECT",
            "subtitle": "Reading rows",
            "completed": false,
            "database-tables": [{"name": "users"}, {"name": "orders"}],
            "exercise-tasks": [{
                "task-id": 1.2,
                "exercise-order": 1,
                "description": "Select everything",
                "initial-query": "SELECT * FROM users;",
                "completed": true,
                "preview-allowed": true,
                "large-query": false,
                "tables": [{"name": "users"}]
            }]
        }))
        .unwrap();

        let lesson = lesson_from_detail(detail).unwrap();
        assert_eq!(lesson.id().as_str(), "lesson-1-basic-select");
        assert_eq!(lesson.tables().len(), 2);

        let task = lesson.task(1).unwrap();
        assert_eq!(task.id().as_str(), "1.2");
        assert!(task.is_completed());
        assert_eq!(task.tables().unwrap().len(), 1);
    }

    #[test]
    fn lesson_detail_with_bad_orders_fails_to_decode() {
        let detail: LessonDetailDto = serde_json::from_value(json!({
            "id": "l",
            "title": "t",
            "subtitle": null,
            "database-tables": null,
            "exercise-tasks": [
                {"task-id": 1.1, "exercise-order": 1},
                {"task-id": 1.3, "exercise-order": 3}
            ]
        }))
        .unwrap();

        let err = lesson_from_detail(detail).unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn rows_project_onto_declared_column_order() {
        let response: PreviewResponseDto = serde_json::from_value(json!({
            "results": {
                "columns": ["id", "name"],
                "rows": [
                    {"name": "ada", "id": 1},
                    {"id": 2, "name": null},
                    {"id": 3}
                ]
            }
        }))
        .unwrap();

        let table = preview_from_response(response).unwrap();
        assert_eq!(table.columns(), ["id", "name"]);
        assert_eq!(
            table.rows(),
            [
                vec!["1".to_string(), "ada".to_string()],
                vec!["2".to_string(), String::new()],
                vec!["3".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn preview_error_field_becomes_rejection() {
        let response: PreviewResponseDto = serde_json::from_value(json!({
            "error": "Invalid SQL query",
            "message": "near WHERE: syntax error"
        }))
        .unwrap();

        let err = preview_from_response(response).unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(m) if m == "Invalid SQL query"));
    }

    #[test]
    fn evaluation_tolerates_null_explanation() {
        let response: EvaluateResponseDto = serde_json::from_value(json!({
            "lessonId": "l",
            "taskNumber": 1.1,
            "resultsMatch": false,
            "userError": null
        }))
        .unwrap();

        let evaluation = evaluation_from_response(response);
        assert!(!evaluation.matched());
        assert!(evaluation.explanation().is_none());
    }

    #[test]
    fn completion_ack_requires_success_marker() {
        let ack: CompletionAckDto = serde_json::from_value(json!({"status": "success"})).unwrap();
        assert!(ack.confirms());
        let ack: CompletionAckDto = serde_json::from_value(json!({"status": "noop"})).unwrap();
        assert!(!ack.confirms());
        let ack: CompletionAckDto = serde_json::from_value(json!({})).unwrap();
        assert!(!ack.confirms());
    }

    #[test]
    fn next_lesson_null_means_none() {
        let dto: NextLessonDto =
            serde_json::from_value(json!({"current_lesson_id": "a", "next_lesson_id": null}))
                .unwrap();
        assert!(next_lesson_from_response(dto).is_none());

        let dto: NextLessonDto = serde_json::from_value(json!({"next_lesson_id": "b"})).unwrap();
        assert_eq!(
            next_lesson_from_response(dto),
            Some(LessonId::new("b"))
        );
    }
}
