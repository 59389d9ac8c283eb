//! Command execution

use crate::cli::{Cli, Commands};
use anyhow::Result;
use briefgen::{
    parse_ask_args, parse_brief_args, ChatClient, EnvCredentials, InputMode, OpenAIClient, Outcome,
    OutputMode, Pipeline, Settings, SettingsOverrides,
};
use std::io;
use tracing::info;

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    // Input is validated before anything else so bad options never cost a request
    let input = match &cli.command {
        Commands::Brief { args } => {
            InputMode::Brief(parse_brief_args(args).map_err(briefgen::Error::from)?)
        }
        Commands::Ask { args } => {
            InputMode::Ask(parse_ask_args(args).map_err(briefgen::Error::from)?)
        }
    };
    let output = if cli.batch {
        OutputMode::Batch
    } else {
        OutputMode::Stream { framed: !cli.raw }
    };

    let overrides = SettingsOverrides {
        model: cli.model,
        temperature: cli.temperature,
        api_base: cli.api_base,
        output_dir: cli.output_dir,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    let pipeline = Pipeline::new(input, output, settings);

    if cli.dry_run {
        pipeline.describe(&mut io::stdout().lock())?;
        return Ok(());
    }

    let connect = |settings: &Settings, api_key: String| -> briefgen::Result<Box<dyn ChatClient>> {
        Ok(Box::new(OpenAIClient::new(&settings.api_base, api_key)?))
    };

    let outcome = pipeline
        .run(&EnvCredentials::default(), connect, &mut io::stdout(), &mut io::stderr())
        .await?;

    match outcome {
        Outcome::Streamed(summary) => info!(fragments = summary.fragments, "stream complete"),
        Outcome::Saved(path) => info!(path = %path.display(), "brief saved"),
    }

    Ok(())
}
