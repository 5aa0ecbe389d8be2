use std::sync::Arc;

use chrono::Utc;
use petromatch_core::{
    ApiError, BoardId, JobBoard, JobListing, MatchResult, ScrapeTask, TaskId, TaskStatus,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use engine_logging::{engine_debug, engine_warn};

use crate::settings::{ClientSettings, EngineError};

/// Supplies the session token attached to every backend request.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Backend scrape/match endpoints. Implementations perform no retries.
#[async_trait::async_trait]
pub trait TaskClient: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<JobBoard>, ApiError>;

    /// Fails with `InvalidArgument` before any network traffic when `board_ids` is empty.
    async fn submit_scrape(&self, board_ids: &[BoardId]) -> Result<ScrapeTask, ApiError>;

    async fn get_task_status(&self, task_id: TaskId) -> Result<ScrapeTask, ApiError>;

    async fn get_raw_results(&self, task_id: TaskId) -> Result<Vec<JobListing>, ApiError>;

    async fn get_matches(&self, task_id: TaskId) -> Result<Vec<MatchResult>, ApiError>;

    async fn trigger_match(&self, task_id: TaskId) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    board_ids: &'a [BoardId],
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    task_id: TaskId,
    status: TaskStatus,
}

#[derive(Debug, Serialize)]
struct MatchRequest {
    task_id: TaskId,
}

/// FastAPI error body; `detail` is a string or a list of validation errors.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub struct ReqwestTaskClient {
    root: Url,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl ReqwestTaskClient {
    pub fn new(
        settings: &ClientSettings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, EngineError> {
        let root = settings.api_root()?;
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::HttpClient(err.to_string()))?;
        Ok(Self {
            root,
            http,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.root
            .join(path)
            .map_err(|err| ApiError::invalid_argument(format!("bad endpoint {path}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        engine_debug!("GET {}", url);
        let body = self.send(self.http.get(url)).await?;
        decode(&body)
    }

    async fn post_json<B: Serialize>(&self, path: &str, payload: &B) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        engine_debug!("POST {}", url);
        let encoded = serde_json::to_vec(payload)
            .map_err(|err| ApiError::invalid_argument(format!("unencodable payload: {err}")))?;
        self.send(
            self.http
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(encoded),
        )
        .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let message = error_detail(&body)
            .or_else(|| status.canonical_reason().map(ToOwned::to_owned))
            .unwrap_or_default();
        if status.is_client_error() {
            Err(ApiError::rejected(status.as_u16(), message))
        } else {
            Err(ApiError::server_fault(status.as_u16(), message))
        }
    }
}

#[async_trait::async_trait]
impl TaskClient for ReqwestTaskClient {
    async fn list_boards(&self) -> Result<Vec<JobBoard>, ApiError> {
        self.get_json("jobs/boards").await
    }

    async fn submit_scrape(&self, board_ids: &[BoardId]) -> Result<ScrapeTask, ApiError> {
        if board_ids.is_empty() {
            return Err(ApiError::invalid_argument(
                "at least one job board must be selected",
            ));
        }
        let body = self
            .post_json("jobs/scrape", &ScrapeRequest { board_ids })
            .await?;
        let response: ScrapeResponse = decode(&body)?;
        // The submission response carries no timestamp.
        Ok(ScrapeTask {
            task_id: response.task_id,
            status: response.status,
            created_at: Utc::now(),
        })
    }

    async fn get_task_status(&self, task_id: TaskId) -> Result<ScrapeTask, ApiError> {
        self.get_json(&format!("jobs/status/{task_id}")).await
    }

    async fn get_raw_results(&self, task_id: TaskId) -> Result<Vec<JobListing>, ApiError> {
        self.get_json(&format!("jobs/results/{task_id}")).await
    }

    async fn get_matches(&self, task_id: TaskId) -> Result<Vec<MatchResult>, ApiError> {
        self.get_json(&format!("jobs/matches/{task_id}")).await
    }

    async fn trigger_match(&self, task_id: TaskId) -> Result<(), ApiError> {
        self.post_json("jobs/match", &MatchRequest { task_id })
            .await
            .map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        engine_warn!("Undecodable backend response: {}", err);
        ApiError::server_fault(200, format!("malformed response body: {err}"))
    })
}

fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::unavailable(format!("request timed out: {err}"));
    }
    ApiError::unavailable(err.to_string())
}
