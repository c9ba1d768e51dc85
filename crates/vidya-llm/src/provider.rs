//! Adapter selection from configuration

use std::env;
use vidya_core::config::{LayeredConfig, Provider, ProviderSpec};
use vidya_core::error::{Result, VidyaError};

use crate::ollama::{OllamaEmbedder, OllamaGenerator};
use crate::openai::{OpenAiEmbedder, OpenAiGenerator, OPENAI_BASE_URL};
use crate::ports::{Embedder, Generator};

/// Environment variable holding the OpenAI secret
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Optional override for OpenAI-compatible endpoints
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Read the OpenAI key; absence is a fatal configuration error
pub fn openai_api_key() -> Result<String> {
    match env::var(OPENAI_API_KEY) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(VidyaError::ConfigMissing { key: OPENAI_API_KEY.to_string() }),
    }
}

fn openai_base_url() -> String {
    env::var(OPENAI_BASE_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
}

/// Build the embedder named by `spec`
pub fn build_embedder(spec: &ProviderSpec, config: &LayeredConfig) -> Result<Box<dyn Embedder>> {
    tracing::debug!("Using embedder {}", spec);

    let embedder: Box<dyn Embedder> = match spec.provider {
        Provider::OpenAi => {
            Box::new(OpenAiEmbedder::detect(openai_base_url(), openai_api_key()?, &spec.model)?)
        }
        Provider::Ollama => {
            Box::new(OllamaEmbedder::detect(config.ollama_url.value.as_str(), &spec.model)?)
        }
    };

    Ok(embedder)
}

/// Build the generator named by `spec`
pub fn build_generator(spec: &ProviderSpec, config: &LayeredConfig) -> Result<Box<dyn Generator>> {
    tracing::debug!("Using generator {}", spec);

    let generator: Box<dyn Generator> = match spec.provider {
        Provider::OpenAi => {
            Box::new(OpenAiGenerator::new(openai_base_url(), openai_api_key()?, &spec.model)?)
        }
        Provider::Ollama => {
            Box::new(OllamaGenerator::new(config.ollama_url.value.as_str(), &spec.model)?)
        }
    };

    Ok(generator)
}

/// Embed a fixed string to learn an embedder's output width
pub(crate) fn measure_dimensions(embedder: &dyn Embedder) -> Result<usize> {
    let vectors = embedder.embed(&["dimension check"])?;
    match vectors.first() {
        Some(vector) if !vector.is_empty() => Ok(vector.len()),
        _ => Err(VidyaError::EmbedderUnavailable {
            reason: format!("'{}' returned no embedding for a sample string", embedder.model_name()),
            remediation: "Check that the model is an embedding model".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_missing_key_is_config_missing() {
        env::remove_var(OPENAI_API_KEY);
        let config = LayeredConfig::with_defaults();

        let err = build_generator(&config.generator.value, &config).err().unwrap();
        assert!(matches!(err, VidyaError::ConfigMissing { ref key } if key == "OPENAI_API_KEY"));
        assert!(err.is_fatal());

        let err = build_embedder(&config.embedder.value, &config).err().unwrap();
        assert!(matches!(err, VidyaError::ConfigMissing { .. }));
    }

    #[test]
    #[serial]
    fn test_blank_key_counts_as_missing() {
        env::set_var(OPENAI_API_KEY, "   ");
        assert!(openai_api_key().is_err());
        env::remove_var(OPENAI_API_KEY);
    }

    #[test]
    #[serial]
    fn test_openai_adapters_with_key() {
        env::set_var(OPENAI_API_KEY, "sk-test");
        let config = LayeredConfig::with_defaults();

        let embedder = build_embedder(&config.embedder.value, &config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
        assert_eq!(embedder.embedder_id(), "openai:text-embedding-3-small");
        assert_eq!(embedder.dimensions(), 1536);

        let generator = build_generator(&config.generator.value, &config).unwrap();
        assert_eq!(generator.model_name(), "gpt-4o-mini");

        env::remove_var(OPENAI_API_KEY);
    }

    #[test]
    #[serial]
    fn test_ollama_needs_no_key() {
        env::remove_var(OPENAI_API_KEY);
        let config = LayeredConfig::with_defaults();

        let spec: ProviderSpec = "ollama:nomic-embed-text".parse().unwrap();
        let embedder = build_embedder(&spec, &config).unwrap();
        assert_eq!(embedder.dimensions(), 768);
        assert_eq!(embedder.embedder_id(), spec.to_string());

        let spec: ProviderSpec = "ollama:llama3".parse().unwrap();
        assert_eq!(build_generator(&spec, &config).unwrap().model_name(), "llama3");
    }

    #[test]
    #[serial]
    fn test_base_url_override() {
        env::set_var(OPENAI_BASE_URL_VAR, "http://proxy.local/v1/");
        assert_eq!(openai_base_url(), "http://proxy.local/v1");
        env::remove_var(OPENAI_BASE_URL_VAR);
        assert_eq!(openai_base_url(), OPENAI_BASE_URL);
    }

    struct BlankEmbedder;

    impl Embedder for BlankEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| Vec::new()).collect())
        }

        fn dimensions(&self) -> usize {
            0
        }

        fn model_name(&self) -> &str {
            "blank"
        }
    }

    #[test]
    fn test_measure_rejects_empty_vectors() {
        assert!(matches!(
            measure_dimensions(&BlankEmbedder),
            Err(VidyaError::EmbedderUnavailable { .. })
        ));
    }
}
