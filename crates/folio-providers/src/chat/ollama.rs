//! Ollama chat backend via its OpenAI-compatible API

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use folio_core::{ChatMessage, ChatProvider, Error, OnChunk, Result};

use crate::sse::SseLineBuffer;

const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    stream: bool,
    messages: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
    delta: Option<CompletionDelta>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// Chat generation via a local Ollama server (OpenAI-compatible endpoint)
pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OllamaChat {
    pub fn new(base_url: String, model: String, max_tokens: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            model,
            max_tokens,
        })
    }

    fn build_messages(
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Vec<serde_json::Value> {
        let mut messages = vec![json!({"role": "system", "content": system_prompt})];
        for msg in history {
            messages.push(json!({"role": msg.role, "content": msg.content}));
        }
        messages.push(json!({"role": "user", "content": user_message}));
        messages
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Chat(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Chat(format!(
                "Ollama chat error: {}",
                response.status()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for OllamaChat {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            stream: false,
            messages: Self::build_messages(system_prompt, history, user_message),
        };

        let data: CompletionResponse = self
            .send_request(&request)
            .await?
            .json()
            .await
            .map_err(|e| Error::Chat(format!("Ollama response parse failed: {}", e)))?;

        let reply = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        Ok(reply)
    }

    async fn generate_stream(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
        on_chunk: OnChunk<'_>,
    ) -> Result<()> {
        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            stream: true,
            messages: Self::build_messages(system_prompt, history, user_message),
        };

        let response = self.send_request(&request).await?;
        let mut stream = response.bytes_stream();
        let mut lines = SseLineBuffer::new();

        while let Some(bytes) = stream.next().await {
            let bytes =
                bytes.map_err(|e| Error::Chat(format!("Ollama stream read failed: {}", e)))?;

            for payload in lines.push(&bytes) {
                if payload == "[DONE]" {
                    return Ok(());
                }
                match serde_json::from_str::<CompletionResponse>(&payload) {
                    Ok(data) => {
                        if let Some(text) = data
                            .choices
                            .first()
                            .and_then(|c| c.delta.as_ref())
                            .and_then(|d| d.content.as_deref())
                        {
                            if !text.is_empty() {
                                on_chunk(text);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("unparseable stream line from Ollama: {}", e);
                    }
                }
            }
        }

        Ok(())
    }
}
