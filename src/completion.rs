//! One completion call, normalized to a fragment stream or a JSON-bearing string

use crate::client::{ChatClient, ChatOptions, StreamEvent};
use crate::prompt::PromptPair;
use crate::{Error, Result};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;

/// How the answer is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Incremental text fragments
    Streaming,
    /// One complete JSON document
    SingleShot,
}

/// Everything needed for one call to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub prompts: PromptPair,
    pub mode: Mode,
}

impl CompletionRequest {
    fn options(&self) -> ChatOptions {
        ChatOptions {
            model: self.model.clone(),
            temperature: Some(self.temperature),
            json: self.mode == Mode::SingleShot,
        }
    }
}

/// Lazily produced text fragments in arrival order. Dropping the stream
/// abandons the request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Answer to a [`CompletionRequest`]
pub enum CompletionResponse {
    Stream(FragmentStream),
    /// Non-empty text expected to hold a JSON document
    Single(String),
}

impl std::fmt::Debug for CompletionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionResponse::Stream(_) => f.write_str("Stream(..)"),
            CompletionResponse::Single(text) => f.debug_tuple("Single").field(text).finish(),
        }
    }
}

fn into_fragment(event: Result<StreamEvent>) -> Option<Result<String>> {
    match event {
        Ok(event) if event.done => {
            if let Some(usage) = event.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "stream finished"
                );
            }
            None
        }
        Ok(event) => Some(Ok(event.delta)),
        Err(e) => Some(Err(e)),
    }
}

/// Issue exactly one call for `request`.
///
/// In streaming mode the call is made when the returned stream is first
/// polled. In single-shot mode an answer without text is
/// [`Error::EmptyResponse`].
pub async fn complete(
    client: &dyn ChatClient,
    request: &CompletionRequest,
) -> Result<CompletionResponse> {
    let messages = request.prompts.messages();
    let options = request.options();

    match request.mode {
        Mode::Streaming => {
            let fragments = client
                .chat_stream(&messages, &options)
                .filter_map(|event| futures::future::ready(into_fragment(event)));
            Ok(CompletionResponse::Stream(Box::pin(fragments)))
        }
        Mode::SingleShot => {
            let text = client
                .chat(&messages, &options)
                .await?
                .filter(|text| !text.trim().is_empty())
                .ok_or(Error::EmptyResponse)?;
            Ok(CompletionResponse::Single(text))
        }
    }
}
