use crate::adapters::retry::RetryPolicy;
use crate::utils::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lotofacil-etl/", env!("CARGO_PKG_VERSION"));
const BODY_SNIPPET_CHARS: usize = 120;

/// Result of fetching one URL. Upstream failures never surface as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Json(Value),
    Unavailable { attempts: u32, reason: String },
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {snippet:?}")]
    Status { status: u16, snippet: String },
    #[error("invalid JSON body: {0}")]
    Body(reqwest::Error),
}

pub fn latest_url(base: &str, latest_path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        latest_path.trim_matches('/')
    )
}

pub fn contest_url(base: &str, number: u32) -> String {
    format!("{}/{}", base.trim_end_matches('/'), number)
}

pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        // results change a few times a week; never accept a cached copy
        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, retry })
    }

    /// GETs `url`, retrying failed attempts per the retry policy.
    pub async fn fetch_json(&self, url: &str) -> FetchOutcome {
        let max_attempts = self.retry.max_attempts;
        let mut attempt = 1;

        loop {
            tracing::debug!("🌐 GET {} (attempt {}/{})", url, attempt, max_attempts);

            let failure = match self.attempt(url).await {
                Ok(Value::Null) => {
                    tracing::warn!("⚠️ {} returned an empty JSON body", url);
                    return FetchOutcome::Unavailable {
                        attempts: attempt,
                        reason: "API returned a null JSON body".to_string(),
                    };
                }
                Ok(json) => return FetchOutcome::Json(json),
                Err(e) => e,
            };

            tracing::warn!(
                "⚠️ {} failed (attempt {}/{}): {}",
                url,
                attempt,
                max_attempts,
                failure
            );

            match self.retry.delay_after(attempt) {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::warn!("🧊 Giving up on {} after {} attempt(s)", url, attempt);
                    return FetchOutcome::Unavailable {
                        attempts: attempt,
                        reason: failure.to_string(),
                    };
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> std::result::Result<Value, AttemptError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                snippet: body.chars().take(BODY_SNIPPET_CHARS).collect(),
            });
        }

        response.json::<Value>().await.map_err(AttemptError::Body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Backoff;
    use httpmock::prelude::*;

    fn fetcher(max_attempts: u32) -> HttpFetcher {
        let retry = RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        };
        HttpFetcher::new(Duration::from_secs(5), retry).unwrap()
    }

    #[test]
    fn urls_ignore_trailing_slashes() {
        assert_eq!(
            latest_url("http://api/lotofacil/", "/ultimo"),
            "http://api/lotofacil/ultimo"
        );
        assert_eq!(
            contest_url("http://api/lotofacil/", 3001),
            "http://api/lotofacil/3001"
        );
    }

    #[tokio::test]
    async fn returns_json_and_sends_cache_busting_headers() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/lotofacil")
                .header("cache-control", "no-cache, no-store, must-revalidate")
                .header("pragma", "no-cache");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"concurso": 1}]));
        });

        let outcome = fetcher(3).fetch_json(&server.url("/api/lotofacil")).await;

        api_mock.assert();
        assert_eq!(
            outcome,
            FetchOutcome::Json(serde_json::json!([{"concurso": 1}]))
        );
    }

    #[tokio::test]
    async fn retries_then_reports_unavailable() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/lotofacil");
            then.status(503).body("Service Unavailable");
        });

        let outcome = fetcher(3).fetch_json(&server.url("/api/lotofacil")).await;

        api_mock.assert_hits(3);
        match outcome {
            FetchOutcome::Unavailable { attempts, reason } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("503"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_json_is_a_failed_attempt() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/lotofacil");
            then.status(200).body("<html>maintenance</html>");
        });

        let outcome = fetcher(2).fetch_json(&server.url("/api/lotofacil")).await;

        api_mock.assert_hits(2);
        assert!(matches!(outcome, FetchOutcome::Unavailable { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn null_body_is_unavailable_without_retry() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/lotofacil");
            then.status(200)
                .header("Content-Type", "application/json")
                .body("null");
        });

        let outcome = fetcher(3).fetch_json(&server.url("/api/lotofacil")).await;

        api_mock.assert_hits(1);
        assert!(matches!(outcome, FetchOutcome::Unavailable { attempts: 1, .. }));
    }
}
