use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::DEFAULT_SMOOTHING;
use crate::rerank::DEFAULT_TRADEOFF;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub inputs: InputsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub top_k: usize,
    pub tradeoff: f64,
    pub smoothing: f64,
    pub filter_seen: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputsConfig {
    pub format: InputFormat,
    pub catalog: PathBuf,
    pub interactions: PathBuf,
    pub recommendations: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Csv,
    Tsv,
}

impl InputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub top_k: Option<usize>,
    pub tradeoff: Option<f64>,
    pub smoothing: Option<f64>,
    pub filter_seen: Option<bool>,
    pub format: Option<InputFormat>,
    pub catalog: Option<PathBuf>,
    pub interactions: Option<PathBuf>,
    pub recommendations: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                top_k: 10,
                tradeoff: DEFAULT_TRADEOFF,
                smoothing: DEFAULT_SMOOTHING,
                filter_seen: true,
            },
            inputs: InputsConfig {
                format: InputFormat::Csv,
                catalog: PathBuf::from("data/catalog.csv"),
                interactions: PathBuf::from("data/interactions.csv"),
                recommendations: PathBuf::from("data/recommendations.csv"),
            },
            output: OutputConfig { dir: PathBuf::from("out") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            other => Err(ConfigError::Validation(format!(
                "unsupported input format `{other}` (expected csv|tsv)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("recal.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(top_k) = engine.top_k {
                self.engine.top_k = top_k;
            }
            if let Some(tradeoff) = engine.tradeoff {
                self.engine.tradeoff = tradeoff;
            }
            if let Some(smoothing) = engine.smoothing {
                self.engine.smoothing = smoothing;
            }
            if let Some(filter_seen) = engine.filter_seen {
                self.engine.filter_seen = filter_seen;
            }
        }

        if let Some(inputs) = patch.inputs {
            if let Some(format) = inputs.format {
                self.inputs.format = format;
            }
            if let Some(catalog) = inputs.catalog {
                self.inputs.catalog = catalog;
            }
            if let Some(interactions) = inputs.interactions {
                self.inputs.interactions = interactions;
            }
            if let Some(recommendations) = inputs.recommendations {
                self.inputs.recommendations = recommendations;
            }
        }

        if let Some(output) = patch.output {
            if let Some(dir) = output.dir {
                self.output.dir = dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RECAL_TOP_K") {
            self.engine.top_k = parse_usize("RECAL_TOP_K", &value)?;
        }
        if let Some(value) = read_env("RECAL_TRADEOFF") {
            self.engine.tradeoff = parse_f64("RECAL_TRADEOFF", &value)?;
        }
        if let Some(value) = read_env("RECAL_SMOOTHING") {
            self.engine.smoothing = parse_f64("RECAL_SMOOTHING", &value)?;
        }
        if let Some(value) = read_env("RECAL_FILTER_SEEN") {
            self.engine.filter_seen = parse_bool("RECAL_FILTER_SEEN", &value)?;
        }

        if let Some(value) = read_env("RECAL_INPUT_FORMAT") {
            self.inputs.format = value.parse()?;
        }
        if let Some(value) = read_env("RECAL_CATALOG") {
            self.inputs.catalog = PathBuf::from(value);
        }
        if let Some(value) = read_env("RECAL_INTERACTIONS") {
            self.inputs.interactions = PathBuf::from(value);
        }
        if let Some(value) = read_env("RECAL_RECOMMENDATIONS") {
            self.inputs.recommendations = PathBuf::from(value);
        }

        if let Some(value) = read_env("RECAL_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(value);
        }

        let log_level = read_env("RECAL_LOGGING_LEVEL").or_else(|| read_env("RECAL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("RECAL_LOGGING_FORMAT").or_else(|| read_env("RECAL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(top_k) = overrides.top_k {
            self.engine.top_k = top_k;
        }
        if let Some(tradeoff) = overrides.tradeoff {
            self.engine.tradeoff = tradeoff;
        }
        if let Some(smoothing) = overrides.smoothing {
            self.engine.smoothing = smoothing;
        }
        if let Some(filter_seen) = overrides.filter_seen {
            self.engine.filter_seen = filter_seen;
        }
        if let Some(format) = overrides.format {
            self.inputs.format = format;
        }
        if let Some(catalog) = overrides.catalog {
            self.inputs.catalog = catalog;
        }
        if let Some(interactions) = overrides.interactions {
            self.inputs.interactions = interactions;
        }
        if let Some(recommendations) = overrides.recommendations {
            self.inputs.recommendations = recommendations;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output.dir = output_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("recal.toml"), PathBuf::from("config/recal.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.top_k == 0 {
        return Err(ConfigError::Validation("engine.top_k must be at least 1".to_string()));
    }

    if !engine.tradeoff.is_finite() || !(0.0..=1.0).contains(&engine.tradeoff) {
        return Err(ConfigError::Validation(
            "engine.tradeoff must be in range 0.0..=1.0".to_string(),
        ));
    }

    if !engine.smoothing.is_finite() || engine.smoothing <= 0.0 || engine.smoothing >= 1.0 {
        return Err(ConfigError::Validation(
            "engine.smoothing must be strictly between 0.0 and 1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    inputs: Option<InputsPatch>,
    output: Option<OutputPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    top_k: Option<usize>,
    tradeoff: Option<f64>,
    smoothing: Option<f64>,
    filter_seen: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct InputsPatch {
    format: Option<InputFormat>,
    catalog: Option<PathBuf>,
    interactions: Option<PathBuf>,
    recommendations: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
