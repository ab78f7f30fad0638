//! Chat-completions semantic detector
//!
//! Asks an OpenAI-compatible `/chat/completions` endpoint (OpenRouter by
//! default) to list person names, addresses and health data, then parses the
//! JSON object embedded in the reply. Errors never include the request text or
//! the model's reply, only status codes and parse positions.

use crate::config::SemanticConfig;
use crate::semantic::SemanticDetector;
use async_trait::async_trait;
use kvguard_core::{Error, PiiCategory, RawCandidate, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are a personal data detection expert. Find Turkish personal data in the given text and return it as JSON.

Data types to detect:
- PERSON_NAME: first names and surnames of people
- ADDRESS: home or work addresses, neighbourhood, street and city information
- HEALTH_DATA: illnesses, medication, treatments, health conditions

Output format:
{
  "detected": [
    {
      "type": "PERSON_NAME|ADDRESS|HEALTH_DATA",
      "value": "detected value",
      "start": start_position,
      "end": end_position,
      "confidence": confidence_between_0_and_1
    }
  ]
}"#;

/// Semantic detector backed by a chat-completions endpoint
#[derive(Clone)]
pub struct ChatCompletionsDetector {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    app_url: Option<String>,
    app_title: Option<String>,
}

impl ChatCompletionsDetector {
    /// Create a detector for `endpoint` with a per-request timeout
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: 1000,
            temperature: 0.1,
            app_url: None,
            app_title: None,
        })
    }

    /// Send OpenRouter attribution headers (`HTTP-Referer`, `X-Title`)
    pub fn with_attribution(mut self, app_url: Option<String>, app_title: Option<String>) -> Self {
        self.app_url = app_url;
        self.app_title = app_title;
        self
    }

    /// Build a detector from configuration
    ///
    /// Returns `Ok(None)` when semantic detection is disabled or the API key
    /// variable is unset; detection then runs on patterns alone.
    pub fn from_config(config: &SemanticConfig) -> Result<Option<Self>> {
        if !config.enabled {
            debug!("Semantic detection disabled by configuration");
            return Ok(None);
        }

        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!(
                    env = %config.api_key_env,
                    "API key not found, skipping semantic detection"
                );
                return Ok(None);
            }
        };

        let mut detector =
            Self::new(&config.endpoint, &config.model, api_key, config.timeout())?
                .with_attribution(config.app_url.clone(), config.app_title.clone());
        detector.max_tokens = config.max_tokens;
        detector.temperature = config.temperature;

        Ok(Some(detector))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, text: &str) -> Result<reqwest::Request> {
        let mut builder = self.client.post(&self.endpoint).bearer_auth(&self.api_key);

        if let Some(url) = &self.app_url {
            builder = builder.header("HTTP-Referer", url.as_str());
        }
        if let Some(title) = &self.app_title {
            builder = builder.header("X-Title", title.as_str());
        }

        builder
            .json(&self.request_body(text))
            .build()
            .map_err(|e| {
                Error::internal(format!(
                    "failed to build semantic request: {}",
                    e.without_url()
                ))
            })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Find the personal data in this text:\n\n{}", text),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl std::fmt::Debug for ChatCompletionsDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDetector")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("app_url", &self.app_url)
            .field("app_title", &self.app_title)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SemanticDetector for ChatCompletionsDetector {
    async fn detect_semantic(&self, text: &str) -> Result<Vec<RawCandidate>> {
        let request = self.build_request(text)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::semantic(format!("request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::semantic(format!(
                "endpoint returned status {}",
                status.as_u16()
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|_| Error::semantic("malformed completion response"))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        parse_detections(&content)
    }

    fn name(&self) -> &str {
        "chat_completions"
    }
}

/// Extract candidates from a model reply
///
/// The reply may wrap the JSON object in prose or code fences; the first `{`
/// to the last `}` is parsed. No object at all yields no candidates, an object
/// that is not valid JSON is an error. Items with unknown types or missing
/// fields are skipped individually.
pub fn parse_detections(content: &str) -> Result<Vec<RawCandidate>> {
    let (Some(open), Some(close)) = (content.find('{'), content.rfind('}')) else {
        return Ok(Vec::new());
    };
    if close < open {
        return Ok(Vec::new());
    }

    let payload: DetectionPayload = serde_json::from_str(&content[open..=close]).map_err(|e| {
        Error::semantic(format!(
            "unparsable detection payload at line {} column {}",
            e.line(),
            e.column()
        ))
    })?;

    let total = payload.detected.len();
    let candidates: Vec<RawCandidate> = payload
        .detected
        .into_iter()
        .filter_map(|item| serde_json::from_value::<DetectedItem>(item).ok())
        .filter_map(|item| {
            let category = category_from_label(&item.label)?;
            Some(RawCandidate {
                category,
                value: item.value,
                start: item.start,
                end: item.end,
                confidence: item.confidence,
            })
        })
        .collect();

    if candidates.len() < total {
        debug!(
            skipped = total - candidates.len(),
            "Skipped malformed semantic items"
        );
    }

    Ok(candidates)
}

/// Map a model label to a category, accepting the Turkish labels too
fn category_from_label(label: &str) -> Option<PiiCategory> {
    match label.trim().to_ascii_uppercase().as_str() {
        "PERSON_NAME" | "ISIM" => Some(PiiCategory::PersonName),
        "ADDRESS" | "ADRES" => Some(PiiCategory::Address),
        "HEALTH_DATA" | "SAGLIK_VERISI" => Some(PiiCategory::HealthData),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectionPayload {
    #[serde(default)]
    detected: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct DetectedItem {
    #[serde(rename = "type")]
    label: String,
    value: String,
    start: usize,
    end: usize,
    confidence: f32,
}
