//! # HTTP Summarizer Client (§2, §6)
//!
//! Adapts `SummarizerClient` to an HTTP LLM endpoint over `reqwest`.
//! Transport failures are classified the same way this codebase's other
//! HTTP clients classify `reqwest::Error` (timeout/connect vs. everything
//! else), so the core's retry loop sees a consistent taxonomy regardless
//! of which collaborator raised it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use summarizer_shared::traits::{SummarizeError, SummarizeErrorKind, SummarizerClient};

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

#[derive(Debug)]
pub struct HttpSummarizerClient {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpSummarizerClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl SummarizerClient for HttpSummarizerClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let mut request = self.http.post(self.endpoint("/v1/summarize")).json(&SummarizeRequest { text });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_status(status, body));
        }

        let body: SummarizeResponse = response.json().await.map_err(|e| SummarizeError {
            kind: SummarizeErrorKind::ResponseParsing,
            message: e.to_string(),
        })?;
        Ok(body.summary)
    }

    async fn healthy(&self) -> bool {
        self.http
            .get(self.endpoint("/health"))
            .timeout(self.config.health_timeout)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }
}

fn classify_transport_error(error: reqwest::Error) -> SummarizeError {
    let kind = if error.is_timeout() {
        SummarizeErrorKind::Timeout
    } else if error.is_connect() {
        SummarizeErrorKind::Connection
    } else {
        SummarizeErrorKind::Transport
    };
    SummarizeError {
        kind,
        message: error.to_string(),
    }
}

fn classify_http_status(status: reqwest::StatusCode, body: String) -> SummarizeError {
    let kind = if status == reqwest::StatusCode::SERVICE_UNAVAILABLE || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        SummarizeErrorKind::ServiceUnavailable
    } else if status.is_server_error() {
        SummarizeErrorKind::Transport
    } else {
        SummarizeErrorKind::ResponseParsing
    };
    SummarizeError {
        kind,
        message: format!("{status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_localhost() {
        let config = HttpClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn service_unavailable_status_is_retryable_class() {
        let err = classify_http_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "down".into());
        assert_eq!(err.kind, SummarizeErrorKind::ServiceUnavailable);
    }

    #[test]
    fn too_many_requests_classifies_as_service_unavailable() {
        let err = classify_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert_eq!(err.kind, SummarizeErrorKind::ServiceUnavailable);
    }

    #[test]
    fn client_error_status_classifies_as_response_parsing() {
        let err = classify_http_status(reqwest::StatusCode::BAD_REQUEST, "bad text".into());
        assert_eq!(err.kind, SummarizeErrorKind::ResponseParsing);
    }

    #[test]
    fn server_error_status_classifies_as_transport() {
        let err = classify_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops".into());
        assert_eq!(err.kind, SummarizeErrorKind::Transport);
    }
}
