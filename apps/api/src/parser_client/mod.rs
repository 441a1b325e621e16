//! Parser client: the single point of entry for calls to the remote
//! resume-parsing service.
//!
//! ARCHITECTURAL RULE: No other module may call the parsing endpoint
//! directly. All remote parsing MUST go through this module.
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::parsing::{ParsingMethod, UploadedFile};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API Error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Parsing failed: {0}")]
    Protocol(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Parser response contained no data")]
    MissingData,

    #[error("Remote call failed after {retries} attempts")]
    Exhausted { retries: u32 },
}

/// The `{success, data?, error?}` envelope the parsing service wraps every
/// response in.
#[derive(Debug, Deserialize)]
struct ParserEnvelope {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: String,
}

/// The remote parsing API seam. `ParserClient` is the HTTP implementation;
/// tests substitute in-memory stubs.
#[async_trait]
pub trait ResumeParser: Send + Sync {
    /// Submits one file to the remote service and returns the structured
    /// payload (`data`) verbatim. The payload carries a remote-reported
    /// processing time; callers measure their own instead of trusting it.
    async fn parse(&self, file: &UploadedFile, method: ParsingMethod)
        -> Result<Value, ParserError>;
}

/// HTTP client for the remote parsing service.
/// Retries transient failures (network errors, 429, 5xx) with exponential
/// backoff; application-level failures are never retried.
#[derive(Clone)]
pub struct ParserClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl ParserClient {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            url,
            api_key,
        }
    }
}

#[async_trait]
impl ResumeParser for ParserClient {
    async fn parse(
        &self,
        file: &UploadedFile,
        method: ParsingMethod,
    ) -> Result<Value, ParserError> {
        let mut last_error: Option<ParserError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Parse attempt {} for '{}' failed, retrying after {}ms...",
                    attempt,
                    file.filename,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            // The form is consumed by send(), so it is rebuilt per attempt.
            let part = multipart::Part::bytes(file.bytes.to_vec())
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)?;
            let form = multipart::Form::new()
                .part("file", part)
                .text("method", method.as_str());

            let mut request = self.client.post(&self.url).multipart(form);
            if let Some(key) = &self.api_key {
                request = request.header("x-api-key", key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ParserError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Parser API returned {} for '{}': {}", status, file.filename, body);
                last_error = Some(remote_error(status.as_u16(), &body));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(remote_error(status.as_u16(), &body));
            }

            let body = response.text().await?;
            let data = decode_envelope(&body)?;

            debug!(
                "Parser API accepted '{}' (method: {})",
                file.filename,
                method.as_str()
            );

            return Ok(data);
        }

        Err(last_error.unwrap_or(ParserError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// Decodes a successful HTTP response body into its `data` payload.
/// A `success=false` envelope is an application-level failure.
fn decode_envelope(body: &str) -> Result<Value, ParserError> {
    let envelope: ParserEnvelope = serde_json::from_str(body)?;

    if !envelope.success {
        return Err(ParserError::Protocol(
            envelope
                .error
                .unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }

    envelope.data.ok_or(ParserError::MissingData)
}

/// Builds a `Remote` error from a non-success HTTP response, preferring the
/// remote-provided `{"error": ...}` message when the body carries one.
fn remote_error(status: u16, body: &str) -> ParserError {
    let message = serde_json::from_str::<RemoteErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        });
    ParserError::Remote { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_envelope_returns_data_verbatim() {
        let body = r#"{"success": true, "data": {"name": "Ada", "processing_time": 2.4}}"#;
        let data = decode_envelope(body).unwrap();
        assert_eq!(data, json!({"name": "Ada", "processing_time": 2.4}));
    }

    #[test]
    fn test_decode_envelope_failure_flag_is_protocol_error() {
        let body = r#"{"success": false, "error": "unreadable document"}"#;
        match decode_envelope(body) {
            Err(ParserError::Protocol(msg)) => assert_eq!(msg, "unreadable document"),
            other => panic!("Expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_failure_without_message_is_generic() {
        let body = r#"{"success": false}"#;
        match decode_envelope(body) {
            Err(ParserError::Protocol(msg)) => assert_eq!(msg, "Unknown error"),
            other => panic!("Expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope_success_without_data_is_missing_data() {
        let body = r#"{"success": true}"#;
        assert!(matches!(
            decode_envelope(body),
            Err(ParserError::MissingData)
        ));
    }

    #[test]
    fn test_decode_envelope_garbage_is_parse_error() {
        assert!(matches!(
            decode_envelope("not json"),
            Err(ParserError::Parse(_))
        ));
    }

    #[test]
    fn test_remote_error_prefers_remote_message() {
        match remote_error(500, r#"{"error": "backend exploded"}"#) {
            ParserError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_error_falls_back_to_raw_body() {
        match remote_error(502, "Bad Gateway") {
            ParserError::Remote { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_error_empty_body_is_generic() {
        match remote_error(503, "") {
            ParserError::Remote { message, .. } => assert_eq!(message, "Unknown error"),
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }
}
