mod wire;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use tutor_core::model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonId, PreviewTable, TableName,
    TableSchema, TaskId,
};
use url::Url;

use crate::contract::{
    AnswerGateway, GatewayError, LessonGateway, QueryGateway, SchemaGateway,
};

/// HTTP adapter for the lesson service.
pub struct HttpGateway {
    client: Client,
    base: String,
}

impl HttpGateway {
    /// Build a gateway rooted at `base`. Trailing slashes are dropped so
    /// request paths can be appended verbatim.
    #[must_use]
    pub fn new(base: Url) -> Self {
        let base = String::from(base);
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

fn status_error(status: StatusCode) -> GatewayError {
    match status {
        StatusCode::FORBIDDEN => GatewayError::PermissionDenied,
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        other => GatewayError::Status(other.as_u16()),
    }
}

#[async_trait]
impl LessonGateway for HttpGateway {
    async fn list_lessons(&self) -> Result<Vec<CatalogEntry>, GatewayError> {
        debug!("Fetching the lesson catalog");
        let response = self.client.get(self.endpoint("/lessons")).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let listing: wire::CatalogListing = response.json().await?;
        Ok(wire::catalog_from_listing(listing))
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, GatewayError> {
        debug!("Fetching lesson {id}");
        let url = self.endpoint(&format!("/lessons/details/{id}"));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let detail: wire::LessonDetailDto = response.json().await?;
        wire::lesson_from_detail(detail)
    }

    async fn complete_lesson(&self, id: &LessonId) -> Result<(), GatewayError> {
        debug!("Reporting lesson {id} complete");
        let url = self.endpoint(&format!("/lessons/complete/{id}"));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        // Some deployments answer with a success marker on a non-200 status.
        warn!("Completion for {id} returned status {status}, checking the body marker");
        let ack: wire::CompletionAckDto = response.json().await?;
        if ack.confirms() {
            Ok(())
        } else {
            Err(status_error(status))
        }
    }

    async fn next_lesson(&self, id: &LessonId) -> Result<Option<LessonId>, GatewayError> {
        debug!("Looking up the lesson after {id}");
        let url = self.endpoint(&format!("/lessons/next_lesson/{id}/next"));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let dto: wire::NextLessonDto = response.json().await?;
        Ok(wire::next_lesson_from_response(dto))
    }
}

#[async_trait]
impl SchemaGateway for HttpGateway {
    async fn get_table_meta(&self, name: &TableName) -> Result<TableSchema, GatewayError> {
        debug!("Fetching table metadata for {name}");
        let url = self.endpoint(&format!("/tables/meta/{name}"));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let meta: wire::TableMetaDto = response.json().await?;
        wire::schema_from_meta(meta)
    }

    async fn get_table_rows(&self, name: &TableName) -> Result<PreviewTable, GatewayError> {
        debug!("Fetching table contents for {name}");
        let url = self.endpoint(&format!("/tables/{name}"));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        // Same results envelope as a preview response.
        let body: wire::PreviewResponseDto = response.json().await?;
        wire::preview_from_response(body)
    }
}

#[async_trait]
impl QueryGateway for HttpGateway {
    async fn preview(
        &self,
        lesson: &LessonId,
        task: &TaskId,
        query: &str,
    ) -> Result<PreviewTable, GatewayError> {
        debug!("Dispatching preview for task {task} in lesson {lesson}");
        let url = self.endpoint(&format!("/lessons/preview/{lesson}/{task}"));
        let response = self
            .client
            .post(url)
            .json(&wire::PreviewRequestDto { query })
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let message = response
                .json::<wire::PreviewResponseDto>()
                .await
                .ok()
                .and_then(wire::PreviewResponseDto::into_error_message)
                .unwrap_or_else(|| "Invalid SQL Query".to_string());
            return Err(GatewayError::Rejected(message));
        }
        if !status.is_success() {
            return Err(status_error(status));
        }
        let body: wire::PreviewResponseDto = response.json().await?;
        wire::preview_from_response(body)
    }

    async fn evaluate(
        &self,
        lesson: &LessonId,
        task: &ExerciseTask,
        query: &str,
    ) -> Result<Evaluation, GatewayError> {
        debug!("Evaluating task {} in lesson {lesson}", task.id());
        let url = self.endpoint(&format!("/lessons/evaluate/{lesson}/{}", task.id()));
        let payload = wire::EvaluateRequestDto {
            lesson_id: lesson.as_str(),
            task_number: task.id().as_str(),
            query,
        };
        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let body: wire::EvaluateResponseDto = response.json().await?;
        Ok(wire::evaluation_from_response(body))
    }
}

#[async_trait]
impl AnswerGateway for HttpGateway {
    async fn reveal_answer(
        &self,
        lesson: &LessonId,
        task: &TaskId,
    ) -> Result<String, GatewayError> {
        debug!("Requesting the answer for task {task} in lesson {lesson}");
        let url = self.endpoint(&format!("/lessons/answer/{lesson}/{task}"));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let dto: wire::AnswerDto = response.json().await?;
        Ok(dto.answer)
    }
}
