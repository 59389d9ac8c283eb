//! Project brief generation on top of an OpenAI-compatible chat API
mod args;
mod client;
mod completion;
mod config;
mod credentials;
mod message;
mod pipeline;
mod prompt;
mod sink;

use thiserror::Error;

/// Result type for briefgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for briefgen operations
#[derive(Debug, Error)]
pub enum Error {
    /// The API key is not available
    #[error("Missing {var}. Set it in your environment or .env file.")]
    MissingCredential { var: String },

    /// Command-line input failed validation
    #[error(transparent)]
    Args(#[from] ArgsError),

    /// Single-shot response carried no text
    #[error("The model returned no content")]
    EmptyResponse,

    /// Single-shot response was not valid JSON
    #[error("Failed to parse model response as JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// API error reported by the completion service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub use args::{
    parse_ask_args, parse_brief_args, ArgError, ArgsError, AskConfig, BriefConfig, Level,
    TechFocus,
};
pub use client::{ChatClient, ChatOptions, OpenAIClient, StreamEvent};
pub use completion::{complete, CompletionRequest, CompletionResponse, FragmentStream, Mode};
pub use config::{Settings, SettingsOverrides, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials, API_KEY_VAR};
pub use message::{Message, MessageRole, Usage};
pub use pipeline::{InputMode, Outcome, OutputMode, Pipeline};
pub use prompt::{build_ask_prompts, build_brief_prompts, PromptPair};
pub use sink::{brief_file_name, persist_brief, stream_to, StreamSummary, NO_CONTENT_WARNING};
