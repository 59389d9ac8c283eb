//! OpenAI-compatible chat completion client

use super::{message::Message, Error, Result, Usage};
use futures::stream::Stream;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

/// Build an HTTP client. Only connecting is bounded; a streamed response may
/// take as long as the service needs.
fn build_http_client() -> std::result::Result<HttpClient, reqwest::Error> {
    HttpClient::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Turn a failed response into the most specific message available:
/// the service's `error.message`, then the raw body, then the status alone.
pub(crate) fn api_error(status: reqwest::StatusCode, body: &str) -> Error {
    #[derive(Deserialize)]
    struct Envelope {
        error: Option<Detail>,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|d| d.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("request failed with status {}", status));

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

// ---------------------------------------------------------------------------
// SSE buffer
// ---------------------------------------------------------------------------

/// Parsed SSE line types
#[derive(Debug, PartialEq)]
enum SseLine {
    /// `data: [DONE]` stream terminator
    Done,
    /// `data: <json>` payload
    Data(String),
    /// Line that is not valid UTF-8
    Invalid,
    /// Empty, comment, or non-data line
    Skip,
}

/// Accumulates bytes from an HTTP response and yields complete SSE lines.
struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    fn new() -> Self {
        Self { buf: Vec::with_capacity(4096) }
    }

    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete line (terminated by `\n`) from the buffer.
    /// Returns `None` when no complete line is available yet.
    ///
    /// Lines are decoded strictly so a multi-byte character split across
    /// network chunks is only decoded once both halves have arrived.
    fn next_line(&mut self) -> Option<SseLine> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buf.drain(..=pos).collect();
        let Ok(line) = std::str::from_utf8(&raw) else {
            return Some(SseLine::Invalid);
        };
        let line = line.trim();

        if line.is_empty() {
            return Some(SseLine::Skip);
        }

        match line.strip_prefix("data:").map(str::trim_start) {
            Some("[DONE]") => Some(SseLine::Done),
            Some(json_str) => Some(SseLine::Data(json_str.to_string())),
            None => Some(SseLine::Skip),
        }
    }
}

/// Streaming event from the LLM
#[derive(Debug, Clone)]
pub struct StreamEvent {
    /// Text delta for this event
    pub delta: String,

    /// Whether this is the final event
    pub done: bool,

    /// Token usage (only available in the final event)
    pub usage: Option<Usage>,
}

/// Per-request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: Option<f32>,
    /// Ask the service to return a JSON object
    pub json: bool,
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a chat completion request (non-streaming).
    ///
    /// Returns the text of the first choice, `None` when the service sent no
    /// text.
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<Option<String>>;

    /// Send a chat completion request with streaming.
    ///
    /// Nothing is sent until the returned stream is first polled.
    fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

    /// Get the API base URL
    fn api_base(&self) -> &str;
}

/// OpenAI client implementation
pub struct OpenAIClient {
    api_base: String,
    api_key: String,
    http_client: HttpClient,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(OpenAIClient {
            api_base: api_base.into(),
            api_key: api_key.into(),
            http_client: build_http_client()?,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn chat_request(messages: &[Message], options: &ChatOptions, stream: bool) -> ChatRequest {
    ChatRequest {
        model: options.model.clone(),
        messages: messages.to_vec(),
        stream,
        temperature: options.temperature,
        response_format: options.json.then(|| ResponseFormat {
            type_: "json_object".to_string(),
        }),
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<Option<String>> {
        let request = chat_request(messages, options, false);
        tracing::debug!(model = %request.model, "sending chat completion request");

        let response = self
            .http_client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let response: ChatResponse = serde_json::from_str(&body)?;
        if let Some(usage) = response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat completion finished"
            );
        }

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    fn chat_stream(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>> {
        let url = self.url();
        let request = chat_request(messages, options, true);
        let api_key = self.api_key.clone();
        let http_client = self.http_client.clone();

        Box::pin(async_stream::stream! {
            tracing::debug!(model = %request.model, "sending streaming chat completion request");

            let response = match http_client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield Err(Error::from(e));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield Err(api_error(status, &body));
                return;
            }

            let mut stream = response.bytes_stream();

            use futures::StreamExt;
            let mut sse = SseBuffer::new();
            let mut usage: Option<Usage> = None;

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(Error::from(e));
                        return;
                    }
                };

                sse.extend(&chunk);

                while let Some(sse_line) = sse.next_line() {
                    match sse_line {
                        SseLine::Done => {
                            yield Ok(StreamEvent { delta: String::new(), done: true, usage });
                            return;
                        }
                        SseLine::Data(json_str) => {
                            match serde_json::from_str::<ChatStreamChunk>(&json_str) {
                                Ok(chunk) => {
                                    if let Some(u) = chunk.usage {
                                        usage = Some(u.into());
                                    }

                                    if let Some(choice) = chunk.choices.into_iter().next() {
                                        let delta_text = choice.delta.content.unwrap_or_default();
                                        if !delta_text.is_empty() {
                                            yield Ok(StreamEvent {
                                                delta: delta_text,
                                                done: false,
                                                usage: None,
                                            });
                                        }
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Failed to parse SSE chunk: {}", e);
                                }
                            }
                        }
                        SseLine::Invalid => {
                            tracing::warn!("Skipping SSE line with invalid UTF-8");
                        }
                        SseLine::Skip => {}
                    }
                }
            }

            tracing::debug!("SSE stream closed without [DONE]");
        })
    }

    fn api_base(&self) -> &str {
        &self.api_base
    }
}

// OpenAI wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<ChatUsage> for Usage {
    fn from(u: ChatUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
}

#[derive(Debug, Deserialize)]
struct ChatStreamDelta {
    #[serde(default)]
    content: Option<String>,
}
