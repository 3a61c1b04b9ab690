//! Configuration-selected providers
//!
//! A [`ProviderConfig`] names one provider and its settings. The pipeline
//! receives an [`AnyProvider`] built from it, so which backend handles a call
//! is decided by the caller's configuration, not by branching inside the
//! extraction code.

use crate::anthropic::{self, AnthropicProvider};
use crate::ollama::{self, OllamaProvider};
use crate::pricing::Pricing;
use crate::{LlmError, MockProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use takeoff_domain::{ImageRef, VisionProvider, VisionResponse};

/// Provider selection and settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Canned responses, no network
    Mock {
        /// Response returned for every call
        #[serde(default = "default_mock_response")]
        response: String,
    },

    /// Local Ollama instance
    Ollama {
        /// API endpoint
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        /// Multimodal model name
        model: String,
        /// Request timeout; none by default
        #[serde(default)]
        timeout_secs: Option<u64>,
        /// Rate card
        #[serde(default)]
        pricing: Pricing,
    },

    /// Anthropic Messages API
    Anthropic {
        /// API endpoint
        #[serde(default = "default_anthropic_endpoint")]
        endpoint: String,
        /// Model name
        model: String,
        /// Environment variable holding the API key
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        /// Request timeout; none by default
        #[serde(default)]
        timeout_secs: Option<u64>,
        /// Rate card
        #[serde(default)]
        pricing: Pricing,
    },
}

fn default_mock_response() -> String {
    "{}".to_string()
}

fn default_ollama_endpoint() -> String {
    ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_anthropic_endpoint() -> String {
    anthropic::DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    anthropic::DEFAULT_API_KEY_ENV.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama {
            endpoint: default_ollama_endpoint(),
            model: "llava".to_string(),
            timeout_secs: None,
            pricing: Pricing::default(),
        }
    }
}

impl ProviderConfig {
    /// Short provider label
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Mock { .. } => "mock",
            ProviderConfig::Ollama { .. } => "ollama",
            ProviderConfig::Anthropic { .. } => "anthropic",
        }
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Mock { .. } => "mock-vision",
            ProviderConfig::Ollama { model, .. } | ProviderConfig::Anthropic { model, .. } => model,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ProviderConfig::Mock { .. } => Ok(()),
            ProviderConfig::Ollama {
                endpoint, model, ..
            }
            | ProviderConfig::Anthropic {
                endpoint, model, ..
            } => {
                if model.trim().is_empty() {
                    return Err("model must not be empty".to_string());
                }
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(format!("endpoint must be an http(s) URL: {}", endpoint));
                }
                Ok(())
            }
        }
    }
}

/// One of the supported providers
pub enum AnyProvider {
    /// Mock provider
    Mock(MockProvider),
    /// Ollama provider
    Ollama(OllamaProvider),
    /// Anthropic provider
    Anthropic(AnthropicProvider),
}

impl AnyProvider {
    /// Build the provider a configuration describes
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Other)?;

        match config {
            ProviderConfig::Mock { response } => {
                Ok(AnyProvider::Mock(MockProvider::new(response.clone())))
            }
            ProviderConfig::Ollama {
                endpoint,
                model,
                timeout_secs,
                pricing,
            } => {
                let mut provider = OllamaProvider::new(endpoint.clone(), model.clone())
                    .with_pricing(*pricing);
                if let Some(secs) = timeout_secs {
                    provider = provider.with_timeout(Duration::from_secs(*secs))?;
                }
                Ok(AnyProvider::Ollama(provider))
            }
            ProviderConfig::Anthropic {
                endpoint,
                model,
                api_key_env,
                timeout_secs,
                pricing,
            } => {
                let mut provider = AnthropicProvider::from_env(api_key_env, model.clone())?
                    .with_endpoint(endpoint.clone())
                    .with_pricing(*pricing);
                if let Some(secs) = timeout_secs {
                    provider = provider.with_timeout(Duration::from_secs(*secs))?;
                }
                Ok(AnyProvider::Anthropic(provider))
            }
        }
    }
}

impl VisionProvider for AnyProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            AnyProvider::Mock(p) => p.model_name(),
            AnyProvider::Ollama(p) => p.model_name(),
            AnyProvider::Anthropic(p) => p.model_name(),
        }
    }

    fn call_vision(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, Self::Error> {
        match self {
            AnyProvider::Mock(p) => p.call_vision(images, prompt, max_output_tokens),
            AnyProvider::Ollama(p) => p.call_vision(images, prompt, max_output_tokens),
            AnyProvider::Anthropic(p) => p.call_vision(images, prompt, max_output_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_selects_provider() {
        let config: ProviderConfig = from_json(
            r#"{"kind": "ollama", "model": "llava:13b", "timeout_secs": 300}"#,
        );
        assert_eq!(config.kind(), "ollama");
        assert_eq!(config.model(), "llava:13b");
        if let ProviderConfig::Ollama { endpoint, .. } = &config {
            assert_eq!(endpoint, ollama::DEFAULT_ENDPOINT);
        }

        let provider = AnyProvider::from_config(&config).unwrap();
        assert_eq!(provider.model_name(), "llava:13b");
    }

    #[test]
    fn test_mock_config_builds_mock() {
        let config = ProviderConfig::Mock {
            response: r#"{"rooms": []}"#.to_string(),
        };
        let provider = AnyProvider::from_config(&config).unwrap();
        let reply = provider.call_vision(&[], "x", 10).unwrap();
        assert_eq!(reply.text, r#"{"rooms": []}"#);
    }

    #[test]
    fn test_validation() {
        let config = ProviderConfig::Ollama {
            endpoint: "localhost:11434".to_string(),
            model: "llava".to_string(),
            timeout_secs: None,
            pricing: Pricing::default(),
        };
        assert!(config.validate().is_err());
        assert!(AnyProvider::from_config(&config).is_err());
        assert!(ProviderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_anthropic_requires_key() {
        let config = ProviderConfig::Anthropic {
            endpoint: default_anthropic_endpoint(),
            model: "vision-model".to_string(),
            api_key_env: "TAKEOFF_TEST_MISSING_KEY".to_string(),
            timeout_secs: None,
            pricing: Pricing::default(),
        };
        assert!(matches!(
            AnyProvider::from_config(&config),
            Err(LlmError::Authentication(_))
        ));
    }

    fn from_json(json: &str) -> ProviderConfig {
        serde_json::from_str(json).unwrap()
    }
}
