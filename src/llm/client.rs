//! Chat completion client for OpenAI-compatible endpoints

use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::PromptMessage;
use super::StreamingResponse;
use crate::config::AppConfig;
use crate::errors::RagChatError;
use crate::errors::Result;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
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

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API
pub struct LlmClient {
    model: String,
    endpoint: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl LlmClient {
    /// Create a new chat completion client from the application config
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RagChatError::HttpError(e.to_string()))?;

        Ok(Self {
            model: config.llm_model().to_string(),
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm_key().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            client,
        })
    }

    /// Run a chat completion and return the full answer text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, empty choice list)
    pub async fn chat(&self, messages: &[PromptMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({})", url, self.model);

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagChatError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagChatError::LlmError(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagChatError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagChatError::LlmError("No choices in response".to_string()))
    }

    /// Run a chat completion and stream answer fragments as they arrive.
    ///
    /// The provider sends server-sent-event lines; each `data:` payload
    /// carries one delta, and `[DONE]` terminates the stream.
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Malformed event payloads while the stream is consumed
    pub async fn chat_stream(&self, messages: &[PromptMessage]) -> Result<StreamingResponse> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling streaming chat API: {} ({})", url, self.model);

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagChatError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagChatError::LlmError(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut buffer = String::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| RagChatError::HttpError(e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        break 'read;
                    }

                    let parsed: ChatChunk = serde_json::from_str(payload)?;
                    if let Some(delta) = parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                    {
                        if !delta.is_empty() {
                            yield delta;
                        }
                    }
                }
            }
        };

        Ok(StreamingResponse::new(Box::pin(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires a running LLM endpoint"]
    async fn test_chat_completion() {
        let config = AppConfig::default();
        let client = LlmClient::new(&config).unwrap();

        let answer = client
            .chat(&[PromptMessage::user("Say hello in one word.")])
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }
}
