//! Request pipeline shared by every command
//!
//! A [`Pipeline`] combines one input mode (structured brief or free text) with
//! one output mode (terminal stream or JSON file). Credential lookup and client
//! construction are passed in, so the pipeline never touches the process
//! environment and returns every failure as an [`Error`].

use crate::args::{AskConfig, BriefConfig};
use crate::client::ChatClient;
use crate::completion::{complete, CompletionRequest, CompletionResponse, FragmentStream, Mode};
use crate::config::Settings;
use crate::credentials::CredentialProvider;
use crate::prompt::{build_ask_prompts, build_brief_prompts, PromptPair};
use crate::sink::{persist_brief, stream_to, StreamSummary};
use crate::{Error, Result};
use std::io::Write;
use std::path::PathBuf;

const STREAM_START_MARKER: &str = "--- streaming start ---";
const STREAM_END_MARKER: &str = "--- streaming end ---";

/// Where the prompt comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Brief(BriefConfig),
    Ask(AskConfig),
}

/// What happens with the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Print fragments as they arrive, optionally between start/end markers
    Stream { framed: bool },
    /// Request one JSON document and save it under the output directory
    Batch,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Streamed(StreamSummary),
    Saved(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    input: InputMode,
    output: OutputMode,
    settings: Settings,
}

impl Pipeline {
    pub fn new(input: InputMode, output: OutputMode, settings: Settings) -> Self {
        Self {
            input,
            output,
            settings,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.output {
            OutputMode::Stream { .. } => Mode::Streaming,
            OutputMode::Batch => Mode::SingleShot,
        }
    }

    pub fn prompts(&self) -> PromptPair {
        match &self.input {
            InputMode::Brief(config) => build_brief_prompts(config, self.mode()),
            InputMode::Ask(config) => build_ask_prompts(config, self.mode()),
        }
    }

    /// The request this pipeline sends. A model chosen in free-text input
    /// takes precedence over the settings.
    pub fn request(&self) -> CompletionRequest {
        let model = match &self.input {
            InputMode::Ask(config) => config.model().unwrap_or(self.settings.model.as_str()),
            InputMode::Brief(_) => self.settings.model.as_str(),
        };

        CompletionRequest {
            model: model.to_string(),
            temperature: self.settings.temperature,
            prompts: self.prompts(),
            mode: self.mode(),
        }
    }

    /// Print the request without sending it
    pub fn describe<W: Write>(&self, out: &mut W) -> Result<()> {
        let request = self.request();
        writeln!(out, "=== Dry Run Mode ===")?;
        writeln!(out, "API Base: {}", self.settings.api_base)?;
        writeln!(out, "Model: {}", request.model)?;
        writeln!(out, "Temperature: {}", request.temperature)?;
        writeln!(out, "Mode: {:?}", request.mode)?;
        if self.output == OutputMode::Batch {
            writeln!(out, "Output directory: {}", self.settings.output_dir.display())?;
        }
        writeln!(out)?;
        writeln!(out, "System: {}", request.prompts.system)?;
        writeln!(out)?;
        writeln!(out, "User: {}", request.prompts.user)?;
        Ok(())
    }

    /// Run the request end to end.
    ///
    /// The API key is looked up first; without it `connect` is never called and
    /// nothing is sent. `connect` receives the settings and the key and builds
    /// the client for the single call this run makes.
    pub async fn run<C, F, W, E>(
        &self,
        credentials: &C,
        connect: F,
        out: &mut W,
        err: &mut E,
    ) -> Result<Outcome>
    where
        C: CredentialProvider + ?Sized,
        F: FnOnce(&Settings, String) -> Result<Box<dyn ChatClient>>,
        W: Write,
        E: Write,
    {
        let api_key = credentials.api_key().ok_or_else(|| Error::MissingCredential {
            var: credentials.name().to_string(),
        })?;
        let client = connect(&self.settings, api_key)?;

        let request = self.request();
        tracing::info!(
            model = %request.model,
            mode = ?request.mode,
            api_base = client.api_base(),
            "requesting completion"
        );

        match complete(&*client, &request).await? {
            CompletionResponse::Stream(fragments) => self.print_stream(fragments, out, err).await,
            CompletionResponse::Single(text) => {
                let path = persist_brief(&text, &self.settings.output_dir, chrono::Utc::now())?;
                writeln!(out, "{}", path.display())?;
                Ok(Outcome::Saved(path))
            }
        }
    }

    async fn print_stream<W: Write, E: Write>(
        &self,
        fragments: FragmentStream,
        out: &mut W,
        err: &mut E,
    ) -> Result<Outcome> {
        let framed = matches!(self.output, OutputMode::Stream { framed: true });

        if framed {
            writeln!(out, "{}\n", STREAM_START_MARKER)?;
        }
        let summary = stream_to(fragments, out, err).await?;
        if framed {
            writeln!(out, "\n\n{}", STREAM_END_MARKER)?;
        } else if summary.had_content {
            writeln!(out)?;
        }

        Ok(Outcome::Streamed(summary))
    }
}
