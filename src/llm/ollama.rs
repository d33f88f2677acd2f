//! Ollama HTTP client.
//!
//! Uses the non-streaming `/api/chat` endpoint for completions and
//! `/api/tags` / `/api/pull` for model management.

use super::{LanguageModel, LlmError, LlmResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection and sampling settings for Ollama.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub retries: usize,
    pub retry_delay_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: "llama3".to_string(),
            temperature: 0.5,
            timeout_seconds: 600,
            retries: 3,
            retry_delay_seconds: 2,
        }
    }
}

impl From<&crate::config::ModelConfig> for OllamaConfig {
    fn from(config: &crate::config::ModelConfig) -> Self {
        Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
            retries: config.retries,
            retry_delay_seconds: config.retry_delay_seconds,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> LlmResult<Self> {
        info!(
            "Initializing Ollama client with model {} at {}",
            config.model_name, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> LlmResult<Vec<String>> {
        let url = format!("{}/api/tags", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Succeeds when the server answers the tags endpoint.
    pub async fn health_check(&self) -> LlmResult<()> {
        let models = self.list_models().await?;
        debug!("Ollama is running with {} models", models.len());
        Ok(())
    }

    /// Make sure the configured model is installed, pulling it if allowed.
    pub async fn ensure_model(&self, pull_missing: bool) -> LlmResult<()> {
        let models = self.list_models().await?;

        if has_model(&models, &self.config.model_name) {
            info!("Model '{}' is available", self.config.model_name);
            return Ok(());
        }

        warn!(
            "Model '{}' not found. Available models: {}",
            self.config.model_name,
            models.join(", ")
        );

        if !pull_missing {
            return Err(LlmError::ModelUnavailable(self.config.model_name.clone()));
        }

        self.pull_model().await
    }

    async fn pull_model(&self) -> LlmResult<()> {
        let url = format!("{}/api/pull", self.config.base_url);
        info!("Pulling model '{}' (this may take a while)", self.config.model_name);

        let request = PullRequest {
            name: &self.config.model_name,
            stream: false,
        };

        // Downloads take far longer than a completion.
        let response = self
            .http_client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_seconds.max(1800)))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Failed to pull model '{}': {}", self.config.model_name, status);
            return Err(LlmError::Api { status, body });
        }

        info!("Model '{}' is ready", self.config.model_name);
        Ok(())
    }

    async fn chat_once(&self, system: &str, prompt: &str) -> LlmResult<String> {
        let url = format!("{}/api/chat", self.config.base_url);

        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending chat request ({} prompt chars)", prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("Failed to parse Ollama response: {}", e)))?;

        let content = chat_response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_seconds)
        } else if e.is_connect() {
            LlmError::Connect(self.config.base_url.clone())
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn complete(&self, system: &str, prompt: &str) -> LlmResult<String> {
        let attempts = self.config.retries.max(1);
        let mut attempt = 1;

        loop {
            match self.chat_once(system, prompt).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    warn!("{} (retrying {}/{})", e, attempt + 1, attempts);
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exact name match, or a bare name matching its `:latest` tag.
fn has_model(installed: &[String], wanted: &str) -> bool {
    installed.iter().any(|name| {
        name == wanted
            || (!wanted.contains(':') && name.strip_suffix(":latest") == Some(wanted))
    })
}
