//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use vidya_core::config::{
    CliConfigOverrides, ConfigSource, LayeredConfig, Provider, ProviderSpec,
};
use vidya_core::VidyaError;

const VARS: &[&str] = &[
    "VIDYA_SOURCE_DIR",
    "VIDYA_INDEX_PATH",
    "VIDYA_EMBEDDER",
    "VIDYA_GENERATOR",
    "VIDYA_TOP_K",
    "VIDYA_SECTION_MAX_CHARS",
    "VIDYA_OLLAMA_URL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_default_configuration() {
    clear_env();
    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.source_dir.value, PathBuf::from("Documents"));
    assert_eq!(config.index_path.value, PathBuf::from("vidya_index"));
    assert_eq!(config.generator.value, ProviderSpec::new(Provider::OpenAi, "gpt-4o-mini"));
    assert_eq!(config.top_k.value, 5);
    assert_eq!(config.section_max_chars.value, 1500);
    assert_eq!(config.ollama_url.value, "http://localhost:11434");
    assert_eq!(config.top_k.source, ConfigSource::Default);
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
index_path = "cache/index"
# Only override the index, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.index_path.value, PathBuf::from("cache/index"));
    assert_eq!(config.index_path.source, ConfigSource::File);
    assert_eq!(config.source_dir.source, ConfigSource::Default);
    assert_eq!(config.embedder.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("VIDYA_TOP_K", "9");
    env::set_var("VIDYA_EMBEDDER", "ollama:env-model");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
top_k = 3
embedder = "ollama:file-model"
generator = "ollama:llama3"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.top_k.value, 9);
    assert_eq!(config.top_k.source, ConfigSource::Environment);
    assert_eq!(config.embedder.value.model, "env-model");
    assert_eq!(config.embedder.source, ConfigSource::Environment);
    // Untouched by env
    assert_eq!(config.generator.value, ProviderSpec::new(Provider::Ollama, "llama3"));
    assert_eq!(config.generator.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("VIDYA_TOP_K", "zero");
    env::set_var("VIDYA_SECTION_MAX_CHARS", "20");
    env::set_var("VIDYA_GENERATOR", "mystery:model");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.top_k.value, 5);
    assert_eq!(config.top_k.source, ConfigSource::Default);
    assert_eq!(config.section_max_chars.value, 1500);
    assert_eq!(config.generator.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("VIDYA_SOURCE_DIR", "/srv/env-docs");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.source_dir.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        source_dir: Some(PathBuf::from("cli-docs")),
        generator: Some(ProviderSpec::new(Provider::Ollama, "mistral")),
        ..Default::default()
    });

    assert_eq!(config.source_dir.value, PathBuf::from("cli-docs"));
    assert_eq!(config.source_dir.source, ConfigSource::Cli);
    assert_eq!(config.generator.value.provider, Provider::Ollama);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
#[serial]
fn test_resolve_full_workflow() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("vidya.toml");
    fs::write(
        &config_path,
        r#"
source_dir = "file-docs"
section_max_chars = 800
ollama_url = "http://gpu-box:11434"
"#,
    )
    .unwrap();

    env::set_var("VIDYA_INDEX_PATH", "env-index");

    let config = LayeredConfig::resolve(
        Some(&config_path),
        CliConfigOverrides { top_k: Some(2), ..Default::default() },
    )
    .unwrap();

    assert_eq!(config.source_dir.value, PathBuf::from("file-docs"));
    assert_eq!(config.index_path.value, PathBuf::from("env-index"));
    assert_eq!(config.top_k.value, 2);
    assert_eq!(config.section_config().max_chars, 800);
    assert_eq!(config.section_config().combine_under_chars, 160);

    let map = config.to_inspection_map();
    assert_eq!(map["ollama_url"], ("http://gpu-box:11434".to_string(), ConfigSource::File));
    assert_eq!(map["index_path"].1, ConfigSource::Environment);
    assert_eq!(map["top_k"].1, ConfigSource::Cli);

    clear_env();
}

#[test]
#[serial]
fn test_resolve_rejects_zero_top_k() {
    clear_env();
    let result = LayeredConfig::resolve(
        None,
        CliConfigOverrides { top_k: Some(0), ..Default::default() },
    );

    assert!(matches!(result, Err(VidyaError::ConfigInvalid { ref key, .. }) if key == "top_k"));
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid toml content [[[").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());

    assert!(result.is_err());
}

#[test]
fn test_missing_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    let result = LayeredConfig::resolve(Some(&non_existent), CliConfigOverrides::default());

    assert!(matches!(result, Err(VidyaError::ConfigInvalid { .. })));
}
