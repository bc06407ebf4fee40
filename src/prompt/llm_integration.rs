use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::ModelApiConfig;
use crate::errors::{ModelError, StartupError};

/// Which OpenAI-compatible chat-completions service to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenRouter,
    OpenAI,
    /// A locally hosted model behind an OpenAI-compatible server
    Local,
}

impl LlmProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Local => "http://localhost:8000/v1",
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, LlmProvider::Local)
    }
}

/// Settings for one model call site (query generation or answering)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub endpoint_url: Option<String>,
}

impl LlmConfig {
    pub fn for_queries(api: &ModelApiConfig) -> Self {
        Self {
            provider: api.provider,
            model: api.query_model.clone(),
            api_key: api.api_key.clone(),
            temperature: api.query_temperature,
            max_tokens: api.query_max_tokens,
            endpoint_url: api.base_url.clone(),
        }
    }

    pub fn for_answers(api: &ModelApiConfig) -> Self {
        Self {
            provider: api.provider,
            model: api.answer_model.clone(),
            api_key: api.api_key.clone(),
            temperature: api.answer_temperature,
            max_tokens: api.answer_max_tokens,
            endpoint_url: api.base_url.clone(),
        }
    }

    fn base_url(&self) -> &str {
        self.endpoint_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A chat-style request: system instruction plus user content
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the client's configured temperature when set
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: None,
        }
    }

    /// Text of the last user message
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Raw text completion from a chat model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct ChatCompletionsClient {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self, StartupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StartupError::ModelClient(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url());
        tracing::debug!("Sending chat completion to {} (model {})", url, self.config.model);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(request));
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let res = builder.send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelError::Http { status, body });
        }

        let json: Value = res.json().await?;
        extract_content(&json)
    }
}

/// Pull the first choice's message content out of a completion response
fn extract_content(json: &Value) -> Result<String, ModelError> {
    if let Some(choice) = json["choices"].as_array().and_then(|arr| arr.first()) {
        if let Some(msg) = choice["message"]["content"].as_str() {
            return Ok(msg.to_string());
        }
        // Some providers return null content for an empty completion
        if choice["message"]["content"].is_null() && choice["message"].is_object() {
            return Ok(String::new());
        }
    }

    if let Some(error) = json["error"].as_object() {
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return Err(ModelError::Api(message.to_string()));
        }
    }

    Err(ModelError::InvalidResponse)
}
