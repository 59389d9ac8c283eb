//! CLI definitions for briefgen

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "briefgen")]
#[command(about = "Generate project briefs with an OpenAI-compatible LLM", long_about = None)]
pub struct Cli {
    /// Config file (replaces ./briefgen.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config and OPENAI_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Directory for JSON output in batch mode
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Request one JSON document and save it to a file instead of streaming
    #[arg(short, long, global = true)]
    pub batch: bool,

    /// Stream without the start/end markers
    #[arg(long, global = true)]
    pub raw: bool,

    /// Print the request without sending it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate project briefs from structured options
    ///
    /// Required: --level=<junior|intermediate|senior> --domain=<text>
    /// --tech_focus=<frontend|backend|fullstack> --stack=<a,b,c>
    /// --duration=<text> --count=<n>
    Brief {
        /// Brief options as --key=value or --key value
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "OPTIONS"
        )]
        args: Vec<String>,
    },

    /// Send a free-text prompt
    Ask {
        /// Prompt words, optionally with --model=<id>
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "PROMPT"
        )]
        args: Vec<String>,
    },
}

/// Exit status for a command line clap rejected. Usage errors share the
/// status of every other failure; `--help` and `--version` succeed.
pub fn parse_error_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}
