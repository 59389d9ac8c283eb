//! Layered settings
//!
//! Settings are resolved from several sources, lowest priority first:
//! 1. Default values
//! 2. Global config file (`<config dir>/briefgen/config.toml`)
//! 3. Local config file (`./briefgen.toml`, or the file passed with `--config`)
//! 4. Environment variables
//! 5. Command-line options

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default model for every request
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OUTPUT_DIR: &str = "output";
const LOCAL_CONFIG_FILE: &str = "briefgen.toml";

// Environment variables and the setting each one overrides
const ENV_MODEL: &str = "BRIEFGEN_MODEL";
const ENV_TEMPERATURE: &str = "BRIEFGEN_TEMPERATURE";
const ENV_API_BASE: &str = "OPENAI_API_BASE";
const ENV_OUTPUT_DIR: &str = "BRIEFGEN_OUTPUT_DIR";

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Model identifier sent with each request
    pub model: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// API base URL, without the `/chat/completions` suffix
    pub api_base: String,
    /// Directory that receives batch output files
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_base: DEFAULT_API_BASE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// One layer of partial settings.
///
/// Config files deserialize into this type; the CLI fills it from options.
///
/// ```toml
/// model = "gpt-4o-mini"
/// temperature = 0.3
/// api_base = "https://api.openai.com/v1"
/// output_dir = "output"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub api_base: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl SettingsOverrides {
    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
    }

    fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let temperature = match non_empty(ENV_TEMPERATURE) {
            Some(raw) => Some(raw.trim().parse::<f32>().map_err(|_| {
                Error::Config(format!("{} must be a number, got \"{}\"", ENV_TEMPERATURE, raw))
            })?),
            None => None,
        };

        Ok(Self {
            model: non_empty(ENV_MODEL),
            temperature,
            api_base: non_empty(ENV_API_BASE),
            output_dir: non_empty(ENV_OUTPUT_DIR).map(PathBuf::from),
        })
    }
}

impl Settings {
    /// Load settings from the standard locations, the process environment and
    /// `overrides`.
    ///
    /// `config_file` replaces the local `./briefgen.toml` and must exist.
    pub fn load(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let mut files = Vec::new();
        if let Some(global) = dirs::config_dir().map(|d| d.join("briefgen").join("config.toml")) {
            if global.is_file() {
                files.push(global);
            }
        }
        match config_file {
            Some(path) => files.push(path.to_path_buf()),
            None => {
                let local = PathBuf::from(LOCAL_CONFIG_FILE);
                if local.is_file() {
                    files.push(local);
                }
            }
        }

        Self::from_layers(&files, |var| std::env::var(var).ok(), overrides)
    }

    /// Resolve settings from explicit layers: `files` in increasing priority,
    /// then the environment as seen through `env`, then `overrides`.
    pub fn from_layers<F>(files: &[PathBuf], env: F, overrides: &SettingsOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        for file in files {
            tracing::debug!(path = %file.display(), "loading config file");
            settings.apply(SettingsOverrides::from_file(file)?);
        }
        settings.apply(SettingsOverrides::from_env(env)?);
        settings.apply(overrides.clone());
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&mut self, layer: SettingsOverrides) {
        if let Some(model) = layer.model {
            self.model = model;
        }
        if let Some(temperature) = layer.temperature {
            self.temperature = temperature;
        }
        if let Some(api_base) = layer.api_base {
            self.api_base = api_base;
        }
        if let Some(output_dir) = layer.output_dir {
            self.output_dir = output_dir;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.api_base.trim().is_empty() {
            return Err(Error::Config("api_base must not be empty".to_string()));
        }
        Ok(())
    }
}
