//! Ollama Provider Implementation
//!
//! Runs drawing extraction against a local multimodal model (llava, qwen2-vl,
//! llama3.2-vision) through Ollama's generate API. Images are passed in the
//! request's `images` array as base64 strings.
//!
//! # Examples
//!
//! ```no_run
//! use takeoff_llm::OllamaProvider;
//! use takeoff_domain::VisionProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llava");
//! let reply = provider.call_vision(&[], "Describe this drawing", 2048);
//! ```

use crate::pricing::Pricing;
use crate::{block_on, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use takeoff_domain::{ImageRef, VisionProvider, VisionResponse};
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default number of attempts per call (a single attempt, no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Ollama API provider for local vision inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_attempts: u32,
    pricing: Pricing,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Multimodal model to use (e.g., "llava")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pricing: Pricing::default(),
        }
    }

    /// Create a new Ollama provider on the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Apply a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the rate card used to report cost
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Send images and a prompt to the generate API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response format is invalid
    pub async fn generate_vision(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            images: images.iter().map(|i| i.data.as_str()).collect(),
            stream: false,
            options: OllamaOptions {
                num_predict: max_output_tokens,
            },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let body = response.json::<OllamaGenerateResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        debug!(
                            model = %self.model,
                            input_tokens = body.prompt_eval_count,
                            output_tokens = body.eval_count,
                            "Ollama call complete"
                        );
                        return Ok(VisionResponse {
                            text: body.response,
                            tokens_used: body.prompt_eval_count + body.eval_count,
                            cost: self.pricing.cost(body.prompt_eval_count, body.eval_count),
                        });
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_attempts {
                warn!(attempt = attempts, "Ollama call failed, backing off");
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max attempts exceeded".to_string())))
    }
}

impl VisionProvider for OllamaProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn call_vision(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, Self::Error> {
        block_on(self.generate_vision(images, prompt, max_output_tokens))?
    }
}
