use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, error, info};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::PoolProviderConfig;
use crate::errors::ProviderError;
use crate::providers::TranslationProvider;

/// How many of the most recent errors to carry in the give-up summary
const ERROR_SUMMARY_LIMIT: usize = 10;

/// Best-effort pool provider over a set of interchangeable endpoints
///
/// Each pass shuffles the endpoint list to distribute load, tries every
/// endpoint once with a bounded per-call timeout, then sleeps a fixed backoff
/// before the next pass. The provider only gives up once the global retry
/// window has elapsed, surfacing the aggregated most recent errors.
#[derive(Debug)]
pub struct PoolTranslator {
    /// Endpoint base URLs
    endpoints: Vec<String>,
    /// HTTP client for making requests
    client: Client,
    /// Pause between full endpoint passes
    pass_backoff: Duration,
    /// Global retry window
    retry_window: Duration,
    /// Per-request timeout in seconds, kept for error reporting
    request_timeout_secs: u64,
}

/// Request body in the LibreTranslate wire format
#[derive(Debug, Serialize)]
struct PoolRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

/// Response body in the LibreTranslate wire format
///
/// Deserialization doubles as structural validation: a 200 response without
/// the expected field is an attempt failure, not a crash.
#[derive(Debug, Deserialize)]
struct PoolResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl PoolTranslator {
    /// Create a new pool translator from configuration
    pub fn new(config: &PoolProviderConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            pass_backoff: Duration::from_secs(config.pass_backoff_secs),
            retry_window: Duration::from_secs(config.retry_window_secs),
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    /// Try one endpoint once
    async fn try_endpoint(
        &self,
        endpoint: &str,
        text: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/translate", endpoint.trim_end_matches('/'));
        let request = PoolRequest {
            q: text,
            source: "auto",
            target: target_language,
            format: "text",
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.request_timeout_secs)
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: PoolResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(body.translated_text)
    }
}

#[async_trait]
impl TranslationProvider for PoolTranslator {
    fn name(&self) -> &str {
        "pool"
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let deadline = Instant::now() + self.retry_window;
        let mut errors: Vec<String> = Vec::new();
        let mut attempts = 0usize;

        loop {
            // Shuffle before each pass so no single endpoint takes the brunt.
            // The rng is scoped to this block; it is not Send and must not be
            // held across an await point.
            let shuffled: Vec<String> = {
                let mut endpoints = self.endpoints.clone();
                endpoints.shuffle(&mut rand::rng());
                endpoints
            };

            for endpoint in &shuffled {
                if Instant::now() >= deadline {
                    break;
                }
                attempts += 1;

                match self.try_endpoint(endpoint, text, target_language).await {
                    Ok(translated) => {
                        debug!("Pool endpoint {} succeeded after {} attempts", endpoint, attempts);
                        return Ok(translated);
                    }
                    Err(e) => {
                        debug!("Pool endpoint {} failed: {}", endpoint, e);
                        errors.push(format!("{}: {}", endpoint, e));
                    }
                }
            }

            if Instant::now() + self.pass_backoff >= deadline {
                break;
            }

            info!(
                "Retrying pool endpoints after backoff (attempts so far: {})",
                attempts
            );
            tokio::time::sleep(self.pass_backoff).await;
        }

        let recent: Vec<String> = errors
            .iter()
            .rev()
            .take(ERROR_SUMMARY_LIMIT)
            .rev()
            .cloned()
            .collect();
        error!(
            "All pool endpoints failed within the retry window ({} attempts)",
            attempts
        );
        Err(ProviderError::Exhausted {
            attempts,
            summary: recent.join("; "),
        })
    }
}
