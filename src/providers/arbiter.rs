use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::ArbiterConfig;
use crate::errors::ProviderError;
use crate::extractor::UnitContext;
use crate::providers::ArbitrationProvider;

/// Arbitration client speaking the OpenAI chat-completions wire format
///
/// Sends the original text, every candidate translation, and the unit's
/// structural context so the model can let domain context (a button label
/// versus a paragraph) influence word choice. Returns the raw message
/// content; the resolver interprets it defensively.
#[derive(Debug)]
pub struct OpenAiArbiter {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Chat-completions request
#[derive(Debug, Serialize)]
struct ArbiterRequest<'a> {
    model: &'a str,
    messages: Vec<ArbiterMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ArbiterMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Requested response format
#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

/// Chat-completions response
#[derive(Debug, Deserialize)]
struct ArbiterResponse {
    choices: Vec<ArbiterChoice>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct ArbiterChoice {
    message: ArbiterResponseMessage,
}

/// Message payload of a completion choice
#[derive(Debug, Deserialize)]
struct ArbiterResponseMessage {
    content: String,
}

impl OpenAiArbiter {
    /// Create a new arbiter client from configuration
    pub fn new(config: &ArbiterConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Build the arbitration prompt
    fn build_prompt(
        original: &str,
        candidates: &BTreeMap<String, String>,
        context: &UnitContext,
        target_language: &str,
    ) -> String {
        let mut prompt = format!(
            "You are reconciling machine translations of one HTML fragment into '{}'.\n\
             Pick the best candidate or combine them into a better one.\n\
             Respond with a JSON object: {{\"combined\": \"<final translation>\"}}.\n\n\
             Original: {}\n",
            target_language, original
        );
        for (provider, text) in candidates {
            prompt.push_str(&format!("Candidate ({}): {}\n", provider, text));
        }
        let context_json =
            serde_json::to_string(context).unwrap_or_else(|_| context.tag_name.clone());
        prompt.push_str(&format!("Context: {}\n", context_json));
        prompt
    }
}

#[async_trait]
impl ArbitrationProvider for OpenAiArbiter {
    async fn arbitrate(
        &self,
        original: &str,
        candidates: &BTreeMap<String, String>,
        context: &UnitContext,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let prompt = Self::build_prompt(original, candidates, context, target_language);
        let request = ArbiterRequest {
            model: &self.model,
            messages: vec![ArbiterMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Arbiter API error ({}): {}", status, message);
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: ArbiterResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        match body.choices.into_iter().next() {
            Some(choice) => {
                debug!("Arbiter returned a verdict payload");
                Ok(choice.message.content)
            }
            None => Err(ProviderError::ParseError(
                "Response contained no choices".to_string(),
            )),
        }
    }
}
