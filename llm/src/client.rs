//! HTTP client for an Ollama language model server.
//!
//! [`OllamaClient`] sends the whole transcript as one prompt and waits for the
//! complete reply; agents never act on partial output.

use crate::error::LLMError;
use async_trait::async_trait;
use council::Generator;
use ollama_rs::{generation::completion::request::GenerationRequest, Ollama};
use tracing::debug;

pub struct OllamaClient {
    inner: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Result<Self, LLMError> {
        let inner =
            Ollama::try_new(base_url.as_ref()).map_err(|e| LLMError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            inner,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion for `prompt`.
    pub async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let req = GenerationRequest::new(self.model.clone(), prompt.to_string());
        debug!(model = %self.model, chars = prompt.len(), "requesting completion");
        let res = self
            .inner
            .generate(req)
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;
        Ok(res.response)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.complete(prompt).await?)
    }
}
