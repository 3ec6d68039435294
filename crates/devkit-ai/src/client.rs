use std::time::Duration;

use devkit_core::config::Config;
use serde_json::{json, Value};

use crate::error::AiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that turns a prompt into text. The CLI uses [`GeminiClient`];
/// tests substitute canned generators.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        (**self).generate(prompt)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        (**self).generate(prompt)
    }
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Blocking client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::NotConfigured);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Unknown(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Build from user config. No resolvable key is [`AiError::NotConfigured`].
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let key = config.resolve_api_key().ok_or(AiError::NotConfigured)?;
        Self::new(key, &config.model, &config.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "gemini request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| AiError::Network(e.to_string()))?;
        tracing::debug!(status = status.as_u16(), "gemini response");

        if !status.is_success() {
            return Err(classify(status.as_u16(), &text));
        }
        extract_text(&text)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Map a non-success HTTP response onto an [`AiError`].
pub fn classify(status: u16, body: &str) -> AiError {
    let message = error_message(body).unwrap_or_else(|| {
        let excerpt: String = body.trim().chars().take(200).collect();
        if excerpt.is_empty() {
            "no details".to_string()
        } else {
            excerpt
        }
    });
    if status == 401 || status == 403 || body.contains("API_KEY_INVALID") {
        AiError::Auth(message)
    } else if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        AiError::RateLimit(message)
    } else {
        AiError::Unknown(format!("HTTP {status}: {message}"))
    }
}

fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v["error"]["message"].as_str().map(str::to_string)
}

/// Text of the first candidate's first text part.
fn extract_text(body: &str) -> Result<String, AiError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| AiError::Unknown(format!("invalid response JSON: {e}")))?;
    v["candidates"][0]["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().find_map(|p| p["text"].as_str()))
        .map(str::to_string)
        .ok_or_else(|| AiError::Unknown("response contained no text".to_string()))
}
