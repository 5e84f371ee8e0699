use crate::config::GeminiSettings;
use log::{debug, error, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to Gemini failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini API error: {0}")]
    Api(String),

    #[error("prompt blocked by Gemini: {0}")]
    Blocked(String),

    #[error("malformed Gemini response: {0}")]
    Malformed(String),

    #[error("invalid Gemini endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Sampling parameters sent with every assistant request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
}

pub const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    top_p: 0.9,
    top_k: 40,
    max_output_tokens: 512,
    response_mime_type: "text/plain",
};

/// A text-completion service the recipe assistant can hand queries to.
#[allow(async_fn_in_trait)]
pub trait GenerativeBackend {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, BackendError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()?;
        let endpoint = settings
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", settings.model))?;
        info!("Gemini endpoint: {}", endpoint);
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint,
        })
    }
}

impl GenerativeBackend for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, BackendError> {
        let body = request_body(prompt, config);
        debug!("Sending request to Gemini: {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await?;
            error!("Gemini request failed. Status: {}", status);
            error!("Error body: {}", error_body);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let payload = response.json::<Value>().await?;
        debug!("Received response from Gemini: {:?}", payload);
        extract_text(&payload)
    }
}

fn request_body(prompt: &str, config: &GenerationConfig) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{"text": prompt}]
            }
        ],
        "generationConfig": config
    })
}

fn extract_text(payload: &Value) -> Result<String, BackendError> {
    if let Some(message) = payload["error"]["message"].as_str() {
        return Err(BackendError::Api(message.to_string()));
    }
    if let Some(reason) = payload["promptFeedback"]["blockReason"].as_str() {
        return Err(BackendError::Blocked(reason.to_string()));
    }

    let parts = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| BackendError::Malformed("no candidate content".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.is_empty() {
        let reason = payload["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("empty candidate text");
        return Err(BackendError::Malformed(reason.to_string()));
    }
    Ok(text)
}
