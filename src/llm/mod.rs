//! Language model backends.
//!
//! Every agent task is a single completion through [`LanguageModel`].

pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockModel;
pub use ollama::{OllamaClient, OllamaConfig};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Cannot connect to Ollama at {0}. Is Ollama running?")]
    Connect(String),
    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Model '{0}' is not available in Ollama")]
    ModelUnavailable(String),
    #[error("Empty response from model")]
    EmptyResponse,
    #[error("Request failed: {0}")]
    Request(String),
}

impl LlmError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::ModelUnavailable(_))
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A chat model that turns a system prompt and a user prompt into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier shown in reports.
    fn name(&self) -> &str;

    /// Generate a single completion.
    async fn complete(&self, system: &str, prompt: &str) -> LlmResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(LlmError::Timeout(30).is_retryable());
        assert!(LlmError::EmptyResponse.is_retryable());
        assert!(!LlmError::ModelUnavailable("llama3".to_string()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = LlmError::Api {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Ollama API error 500: boom");
        assert!(LlmError::Connect("http://localhost:11434".to_string())
            .to_string()
            .contains("Is Ollama running?"));
    }
}
