// src/services/publisher.rs

//! Post publishing.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use serde_json::json;

use crate::error::{PublishError, Result};
use crate::models::{Credentials, PublisherConfig};
use crate::services::oauth;

/// Identifier the platform assigned to a created post.
pub type PostId = String;

/// Submits composed messages.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> std::result::Result<PostId, PublishError>;
}

/// Publishes through the X API v2 with OAuth 1.0a user context.
pub struct XPublisher {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    data: CreatedPostData,
}

#[derive(Debug, Deserialize)]
struct CreatedPostData {
    id: String,
}

impl XPublisher {
    pub fn new(client: Client, config: &PublisherConfig, credentials: Credentials) -> Result<Self> {
        url::Url::parse(&config.endpoint)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl Publisher for XPublisher {
    async fn publish(&self, text: &str) -> std::result::Result<PostId, PublishError> {
        let authorization = oauth::authorization_header(
            &self.credentials,
            "POST",
            &self.endpoint,
            &[],
            &oauth::nonce(),
            Utc::now().timestamp(),
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let reset_at = rate_limit_reset(response.headers());
        let body = response.text().await?;

        interpret_response(status, reset_at, &body)
    }
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Map a post creation response to a post id or a typed failure.
pub fn interpret_response(
    status: u16,
    reset_at: Option<i64>,
    body: &str,
) -> std::result::Result<PostId, PublishError> {
    match status {
        200..=299 => serde_json::from_str::<CreatedPost>(body)
            .map(|post| post.data.id)
            .map_err(|e| PublishError::MalformedResponse(format!("{e}: {}", snippet(body)))),
        429 | 500..=599 => Err(PublishError::RetryLater {
            status,
            reason: error_reason(body),
            reset_at,
        }),
        _ => Err(PublishError::Rejected {
            status,
            reason: error_reason(body),
        }),
    }
}

/// Human-readable reason from an API error body.
fn error_reason(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("title"))
                .or_else(|| v.pointer("/errors/0/message"))
                .and_then(|s| s.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| snippet(body))
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_post_yields_id() {
        let body = r#"{"data":{"id":"1445880548472328192","text":"hello"}}"#;
        assert_eq!(
            interpret_response(201, None, body).unwrap(),
            "1445880548472328192"
        );
    }

    #[test]
    fn success_without_id_is_malformed() {
        let err = interpret_response(200, None, r#"{"errors":[]}"#).unwrap_err();
        assert!(matches!(err, PublishError::MalformedResponse(_)));
    }

    #[test]
    fn rate_limit_is_retry_later() {
        let err = interpret_response(429, Some(1_760_000_900), r#"{"title":"Too Many Requests"}"#)
            .unwrap_err();

        match err {
            PublishError::RetryLater {
                status,
                reason,
                reset_at,
            } => {
                assert_eq!(status, 429);
                assert_eq!(reason, "Too Many Requests");
                assert_eq!(reset_at, Some(1_760_000_900));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_error_is_retry_later() {
        let err = interpret_response(503, None, "").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn forbidden_is_rejected_with_detail() {
        let body = r#"{"title":"Forbidden","status":403,"detail":"You are not allowed to create a Tweet with duplicate content."}"#;
        let err = interpret_response(403, None, body).unwrap_err();

        match err {
            PublishError::Rejected { status, reason } => {
                assert_eq!(status, 403);
                assert!(reason.contains("duplicate content"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reads_rate_limit_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", "1760000900".parse().unwrap());
        assert_eq!(rate_limit_reset(&headers), Some(1_760_000_900));
        assert_eq!(rate_limit_reset(&HeaderMap::new()), None);
    }
}
