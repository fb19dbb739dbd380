//! HTTP client wrapper for the hosted completion API
//!
//! Exposes exactly the operations the assistant uses (JSON GET, JSON POST,
//! streaming POST) plus a request-mutation hook chain for attaching auth
//! headers. Transport failures and non-success statuses are classified
//! into [`ApiError`] before they reach callers.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Mutates an outbound request before it is sent (auth headers etc).
pub type RequestHook = Box<dyn Fn(RequestBuilder) -> RequestBuilder + Send + Sync>;

/// Classified API failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("authentication rejected ({status})")]
    Auth { status: u16 },

    #[error("rate limited by server")]
    RateLimited,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying later could plausibly succeed. No retries are
    /// performed here; callers surface this in their messaging.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::RateLimited | ApiError::Server { .. }
        )
    }
}

/// Error body shape the API returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Map a transport-level failure into the taxonomy.
pub fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err)
    }
}

/// Map a non-success status plus its body into the taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => ApiError::Auth {
            status: status.as_u16(),
        },
        429 => ApiError::RateLimited,
        500..=599 => ApiError::Server {
            status: status.as_u16(),
            message,
        },
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Narrow client over the HTTP transport.
pub struct ApiClient {
    base_url: String,
    client: Client,
    hooks: Vec<RequestHook>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(format!("Sidekick/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            hooks: Vec::new(),
        })
    }

    /// Register a request-mutation hook. Hooks run in registration order.
    pub fn with_hook(mut self, hook: RequestHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Convenience hook attaching a bearer token to every request.
    pub fn with_bearer_auth(self, token: String) -> Self {
        self.with_hook(Box::new(move |rb| rb.bearer_auth(&token)))
    }

    fn apply_hooks(&self, mut rb: RequestBuilder) -> RequestBuilder {
        for hook in &self.hooks {
            rb = hook(rb);
        }
        rb
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let rb = self.apply_hooks(self.client.get(self.url(path)));
        let response = rb.send().await.map_err(classify_transport)?;
        Self::read_json(response).await
    }

    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let rb = self.apply_hooks(self.client.post(self.url(path)).json(body));
        let response = rb.send().await.map_err(classify_transport)?;
        Self::read_json(response).await
    }

    /// POST and hand back the raw response for incremental consumption.
    /// Status classification happens here so the streaming layer only ever
    /// sees a successful response.
    pub async fn post_stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let rb = self.apply_hooks(self.client.post(self.url(path)).json(body));
        let response = rb.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        Ok(response)
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response.json::<R>().await.map_err(classify_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = ApiClient::new("https://api.example.com/").unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(client.url("/v1/chat"), "https://api.example.com/v1/chat");
    }

    #[test]
    fn classifies_auth_statuses() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, ApiError::Auth { status: 401 }));
        assert!(!err.is_transient());

        let err = classify_status(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, ApiError::Auth { status: 403 }));
    }

    #[test]
    fn classifies_rate_limit_as_transient() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ApiError::RateLimited));
        assert!(err.is_transient());
    }

    #[test]
    fn classifies_server_errors_with_body_message() {
        let err = classify_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"model overloaded"}"#,
        );
        match err {
            ApiError::Server { status, ref message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("expected Server, got {:?}", other),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn classifies_client_errors_as_permanent() {
        let err = classify_status(StatusCode::BAD_REQUEST, r#"{"message":"bad payload"}"#);
        match err {
            ApiError::Api { status, ref message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad payload");
            }
            other => panic!("expected Api, got {:?}", other),
        }
        assert!(!err.is_transient());
    }

    #[test]
    fn falls_back_to_raw_body_when_not_json() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "upstream unavailable\n");
        match err {
            ApiError::Server { message, .. } => assert_eq!(message, "upstream unavailable"),
            other => panic!("expected Server, got {:?}", other),
        }
    }
}
