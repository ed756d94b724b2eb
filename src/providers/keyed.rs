use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;

use crate::app_config::KeyedProviderConfig;
use crate::errors::ProviderError;
use crate::providers::TranslationProvider;

/// Keyed single-endpoint provider (DeepL wire format)
///
/// Makes a bounded number of attempts with exponential backoff. Server and
/// network errors are retried; authentication and other client errors fail
/// fast since retrying cannot fix them.
#[derive(Debug)]
pub struct KeyedTranslator {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Maximum number of attempts
    max_attempts: usize,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Per-request timeout in seconds, kept for error reporting
    request_timeout_secs: u64,
}

/// Response body in the DeepL wire format
#[derive(Debug, Deserialize)]
struct KeyedResponse {
    translations: Vec<KeyedTranslation>,
}

/// One translation entry in a keyed response
#[derive(Debug, Deserialize)]
struct KeyedTranslation {
    text: String,
}

impl KeyedTranslator {
    /// Create a new keyed translator from configuration
    pub fn new(config: &KeyedProviderConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            max_attempts: config.max_attempts,
            backoff_base_ms: config.backoff_base_ms,
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    /// Make one attempt against the endpoint
    async fn try_once(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let params = [
            ("text", text),
            ("target_lang", target_language),
            ("preserve_formatting", "1"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("DeepL-Auth-Key {}", self.api_key),
            )
            .form(&params)
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
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: KeyedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        // Structural validation: an empty translations array is a malformed
        // success, treated as a failure rather than returning empty text
        match body.translations.into_iter().next() {
            Some(translation) => Ok(translation.text),
            None => Err(ProviderError::ParseError(
                "Response contained no translations".to_string(),
            )),
        }
    }

    /// Whether an error is worth another attempt
    fn is_retryable(error: &ProviderError) -> bool {
        match error {
            ProviderError::RequestFailed(_) | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status_code, .. } => {
                *status_code >= 500 || *status_code == 429
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TranslationProvider for KeyedTranslator {
    fn name(&self) -> &str {
        "keyed"
    }

    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match self.try_once(text, target_language).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    if !Self::is_retryable(&e) {
                        error!("Keyed provider failed without retry: {}", e);
                        return Err(e);
                    }
                    debug!(
                        "Keyed provider attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt + 1 < self.max_attempts {
                // Cap the exponent: large configured attempt counts must not
                // overflow the shift
                let backoff_ms = self
                    .backoff_base_ms
                    .saturating_mul(1u64 << attempt.min(16));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        let summary = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        error!(
            "Keyed provider gave up after {} attempts: {}",
            self.max_attempts, summary
        );
        Err(ProviderError::Exhausted {
            attempts: self.max_attempts,
            summary,
        })
    }
}
