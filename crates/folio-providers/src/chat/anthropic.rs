//! Anthropic (Claude) chat backend

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use folio_core::{ChatMessage, ChatProvider, Error, OnChunk, Result};

use crate::sse::SseLineBuffer;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    stream: bool,
    messages: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<StreamDelta>,
}

/// Chat generation via the Anthropic Messages API
pub struct AnthropicChat {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicChat {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens,
        })
    }

    fn build_request(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
        stream: bool,
    ) -> MessagesRequest {
        let mut messages: Vec<serde_json::Value> = history
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();
        messages.push(json!({"role": "user", "content": user_message}));

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system_prompt.to_string(),
            stream,
            messages,
        }
    }

    async fn send_request(&self, request: &MessagesRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Chat(format!("Anthropic request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!(
                "Anthropic error {}: {}",
                status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatProvider for AnthropicChat {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String> {
        let request = self.build_request(system_prompt, history, user_message, false);

        let data: MessagesResponse = self
            .send_request(&request)
            .await?
            .json()
            .await
            .map_err(|e| Error::Chat(format!("Anthropic response parse failed: {}", e)))?;

        let reply = data
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
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
        let request = self.build_request(system_prompt, history, user_message, true);

        let response = self.send_request(&request).await?;
        let mut stream = response.bytes_stream();
        let mut lines = SseLineBuffer::new();

        while let Some(bytes) = stream.next().await {
            let bytes =
                bytes.map_err(|e| Error::Chat(format!("Anthropic stream read failed: {}", e)))?;

            for payload in lines.push(&bytes) {
                match serde_json::from_str::<StreamEvent>(&payload) {
                    Ok(event) if event.kind == "content_block_delta" => {
                        let text = event
                            .delta
                            .filter(|d| d.kind.as_deref() == Some("text_delta"))
                            .and_then(|d| d.text);
                        if let Some(text) = text {
                            on_chunk(&text);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("unparseable stream event from Anthropic: {}", e);
                    }
                }
            }
        }

        Ok(())
    }
}
