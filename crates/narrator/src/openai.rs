//! Narrative generator backed by an OpenAI-compatible chat completions API.

use crate::error::NarratorError;
use crate::prompt::{SYSTEM_PROMPT, period_prompt};
use crate::{Narrative, NarrativeGenerator};
use analytics::PeriodDigest;
use async_trait::async_trait;
use configuration::NarratorSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug)]
pub struct OpenAiNarrator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiNarrator {
    /// Creates a new `OpenAiNarrator`.
    ///
    /// Returns `None` if no API key is configured, allowing the system to
    /// gracefully disable report generation.
    pub fn new(settings: &NarratorSettings) -> Option<Self> {
        if settings.api_key.is_empty() {
            tracing::warn!(
                "Narrator is not configured (missing api_key). Report generation is disabled."
            );
            return None;
        }
        let client = match Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to build the narrator HTTP client.");
                return None;
            }
        };
        Some(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    fn request(&self, digest: &PeriodDigest) -> Request {
        Request {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: period_prompt(digest),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[derive(Serialize)]
struct Request {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Reads the narrative out of the first choice of a completion.
fn parse_narrative(response: Response) -> Result<Narrative, NarratorError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| NarratorError::InvalidResponse("completion had no choices".to_string()))?;

    serde_json::from_str(&content).map_err(|e| NarratorError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, digest: &PeriodDigest) -> Result<Narrative, NarratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request(digest))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(NarratorError::ApiError(format!("{status}: {error_text}")));
        }

        let narrative = parse_narrative(response.json::<Response>().await?)?;
        tracing::debug!(model = %self.model, "Narrative generated.");
        Ok(narrative)
    }
}
