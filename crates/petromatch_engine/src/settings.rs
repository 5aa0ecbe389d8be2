use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid api url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http client could not be built: {0}")]
    HttpClient(String),
    #[error("orchestrator must be created inside a tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Backend root, e.g. `https://api.example.com`; endpoints live under `/jobs/`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parsed backend root with a trailing slash, so relative joins keep any path prefix.
    pub fn api_root(&self) -> Result<Url, EngineError> {
        let invalid = |reason: String| EngineError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut root = Url::parse(self.base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", root.scheme())));
        }
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        Ok(root)
    }
}
