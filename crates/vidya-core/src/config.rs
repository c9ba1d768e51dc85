use crate::error::{Result, VidyaError};
use crate::processing::SectionConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "vidya.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "env",
            ConfigSource::Cli => "cli",
        };
        f.write_str(label)
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Backend serving an embedding or generation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Ollama => "ollama",
        }
    }
}

/// A `provider:model` pair such as `ollama:nomic-embed-text`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderSpec {
    pub provider: Provider,
    pub model: String,
}

impl ProviderSpec {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }
}

impl fmt::Display for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.as_str(), self.model)
    }
}

impl FromStr for ProviderSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (provider, model) = match s.split_once(':') {
            Some((provider, model)) => (provider.trim().to_lowercase(), model.trim()),
            None => ("openai".to_string(), s),
        };

        if model.is_empty() {
            return Err(format!("'{}' names no model", s));
        }

        let provider = match provider.as_str() {
            "openai" => Provider::OpenAi,
            "ollama" => Provider::Ollama,
            other => return Err(format!("unknown provider '{}'; use openai or ollama", other)),
        };

        Ok(ProviderSpec::new(provider, model))
    }
}

/// Parse a provider spec, reporting failures against `key`
pub fn parse_provider_spec(key: &str, s: &str) -> Result<ProviderSpec> {
    s.parse().map_err(|reason| VidyaError::ConfigInvalid { key: key.to_string(), reason })
}

/// Layered configuration for Vidya
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub source_dir: ConfigValue<PathBuf>,
    pub index_path: ConfigValue<PathBuf>,
    pub embedder: ConfigValue<ProviderSpec>,
    pub generator: ConfigValue<ProviderSpec>,
    pub top_k: ConfigValue<usize>,
    pub section_max_chars: ConfigValue<usize>,
    pub ollama_url: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            source_dir: ConfigValue::new(PathBuf::from("Documents"), ConfigSource::Default),
            index_path: ConfigValue::new(PathBuf::from("vidya_index"), ConfigSource::Default),
            embedder: ConfigValue::new(
                ProviderSpec::new(Provider::OpenAi, "text-embedding-3-small"),
                ConfigSource::Default,
            ),
            generator: ConfigValue::new(
                ProviderSpec::new(Provider::OpenAi, "gpt-4o-mini"),
                ConfigSource::Default,
            ),
            top_k: ConfigValue::new(5, ConfigSource::Default),
            section_max_chars: ConfigValue::new(1500, ConfigSource::Default),
            ollama_url: ConfigValue::new(
                "http://localhost:11434".to_string(),
                ConfigSource::Default,
            ),
        }
    }

    /// Resolve every layer: defaults, the config file, the environment,
    /// then CLI overrides, and validate the result.
    ///
    /// An explicit `config_path` must exist; otherwise `vidya.toml` in the
    /// working directory is read when present.
    pub fn resolve(config_path: Option<&Path>, overrides: CliConfigOverrides) -> Result<Self> {
        let mut config = Self::with_defaults();

        match config_path {
            Some(path) => config = config.load_from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    config = config.load_from_file(default_path)?;
                }
            }
        }

        let mut config = config.load_from_env();
        config.update_from_cli(overrides);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| VidyaError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file {}: {}", path.as_ref().display(), e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| VidyaError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(source_dir) = file_config.source_dir {
            self.source_dir.update(source_dir, ConfigSource::File);
        }

        if let Some(index_path) = file_config.index_path {
            self.index_path.update(index_path, ConfigSource::File);
        }

        if let Some(embedder) = file_config.embedder {
            self.embedder.update(parse_provider_spec("embedder", &embedder)?, ConfigSource::File);
        }

        if let Some(generator) = file_config.generator {
            self.generator
                .update(parse_provider_spec("generator", &generator)?, ConfigSource::File);
        }

        if let Some(top_k) = file_config.top_k {
            self.top_k.update(top_k, ConfigSource::File);
        }

        if let Some(max_chars) = file_config.section_max_chars {
            self.section_max_chars.update(max_chars, ConfigSource::File);
        }

        if let Some(url) = file_config.ollama_url {
            self.ollama_url.update(url, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // VIDYA_SOURCE_DIR
        if let Ok(dir) = env::var("VIDYA_SOURCE_DIR") {
            self.source_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        // VIDYA_INDEX_PATH
        if let Ok(path) = env::var("VIDYA_INDEX_PATH") {
            self.index_path.update(PathBuf::from(path), ConfigSource::Environment);
        }

        // VIDYA_EMBEDDER
        if let Ok(spec) = env::var("VIDYA_EMBEDDER") {
            match spec.parse() {
                Ok(embedder) => self.embedder.update(embedder, ConfigSource::Environment),
                Err(reason) => tracing::warn!("Invalid VIDYA_EMBEDDER value '{}': {}", spec, reason),
            }
        }

        // VIDYA_GENERATOR
        if let Ok(spec) = env::var("VIDYA_GENERATOR") {
            match spec.parse() {
                Ok(generator) => self.generator.update(generator, ConfigSource::Environment),
                Err(reason) => {
                    tracing::warn!("Invalid VIDYA_GENERATOR value '{}': {}", spec, reason)
                }
            }
        }

        // VIDYA_TOP_K
        if let Ok(top_k_str) = env::var("VIDYA_TOP_K") {
            match top_k_str.parse::<usize>() {
                Ok(top_k) if top_k >= 1 => self.top_k.update(top_k, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid VIDYA_TOP_K value '{}': expected a positive integer",
                    top_k_str
                ),
            }
        }

        // VIDYA_SECTION_MAX_CHARS
        if let Ok(max_str) = env::var("VIDYA_SECTION_MAX_CHARS") {
            match max_str.parse::<usize>() {
                Ok(max_chars) if max_chars >= SectionConfig::MIN_MAX_CHARS => {
                    self.section_max_chars.update(max_chars, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid VIDYA_SECTION_MAX_CHARS value '{}': expected an integer >= {}",
                    max_str,
                    SectionConfig::MIN_MAX_CHARS
                ),
            }
        }

        // VIDYA_OLLAMA_URL
        if let Ok(url) = env::var("VIDYA_OLLAMA_URL") {
            self.ollama_url.update(url, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(source_dir) = overrides.source_dir {
            self.source_dir.update(source_dir, ConfigSource::Cli);
        }

        if let Some(index_path) = overrides.index_path {
            self.index_path.update(index_path, ConfigSource::Cli);
        }

        if let Some(embedder) = overrides.embedder {
            self.embedder.update(embedder, ConfigSource::Cli);
        }

        if let Some(generator) = overrides.generator {
            self.generator.update(generator, ConfigSource::Cli);
        }

        if let Some(top_k) = overrides.top_k {
            self.top_k.update(top_k, ConfigSource::Cli);
        }
    }

    /// Check value ranges after all layers are applied
    pub fn validate(&self) -> Result<()> {
        if self.top_k.value < 1 {
            return Err(VidyaError::ConfigInvalid {
                key: "top_k".to_string(),
                reason: format!("must be at least 1 (set by {})", self.top_k.source),
            });
        }

        if self.section_max_chars.value < SectionConfig::MIN_MAX_CHARS {
            return Err(VidyaError::ConfigInvalid {
                key: "section_max_chars".to_string(),
                reason: format!(
                    "must be at least {} (set by {})",
                    SectionConfig::MIN_MAX_CHARS,
                    self.section_max_chars.source
                ),
            });
        }

        Ok(())
    }

    /// PDF sectioning parameters derived from `section_max_chars`
    pub fn section_config(&self) -> SectionConfig {
        SectionConfig::with_max_chars(self.section_max_chars.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "source_dir".to_string(),
            (self.source_dir.value.display().to_string(), self.source_dir.source),
        );

        map.insert(
            "index_path".to_string(),
            (self.index_path.value.display().to_string(), self.index_path.source),
        );

        map.insert("embedder".to_string(), (self.embedder.value.to_string(), self.embedder.source));

        map.insert(
            "generator".to_string(),
            (self.generator.value.to_string(), self.generator.source),
        );

        map.insert("top_k".to_string(), (self.top_k.value.to_string(), self.top_k.source));

        map.insert(
            "section_max_chars".to_string(),
            (self.section_max_chars.value.to_string(), self.section_max_chars.source),
        );

        map.insert("ollama_url".to_string(), (self.ollama_url.value.clone(), self.ollama_url.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    source_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    embedder: Option<String>,
    generator: Option<String>,
    top_k: Option<usize>,
    section_max_chars: Option<usize>,
    ollama_url: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub source_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub embedder: Option<ProviderSpec>,
    pub generator: Option<ProviderSpec>,
    pub top_k: Option<usize>,
}
