//! Takeoff Vision Provider Layer
//!
//! Implementations of the `VisionProvider` capability from `takeoff-domain`.
//!
//! # Architecture
//!
//! Each provider differs only in how it shapes the image/content payload and
//! reads back usage. Which provider a run uses is decided by a
//! [`ProviderConfig`] value passed in by the caller; there is no process-wide
//! "current provider".
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API with multimodal models
//! - `AnthropicProvider`: Anthropic Messages API
//! - `AnyProvider`: One of the above, built from configuration
//!
//! # Examples
//!
//! ```
//! use takeoff_llm::MockProvider;
//! use takeoff_domain::VisionProvider;
//!
//! let provider = MockProvider::new(r#"{"rooms": []}"#);
//! let result = provider.call_vision(&[], "test prompt", 1024).unwrap();
//! assert_eq!(result.text, r#"{"rooms": []}"#);
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod ollama;
pub mod pricing;
pub mod provider;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use takeoff_domain::{ImageRef, VisionProvider, VisionResponse};
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use pricing::Pricing;
pub use provider::{AnyProvider, ProviderConfig};

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Run an async provider call to completion on a private runtime
///
/// The `VisionProvider` capability is synchronous; HTTP providers use this to
/// drive their async clients.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// response registered with [`MockProvider::add_response`] is returned when the
/// prompt contains its key; the first matching key wins.
///
/// # Examples
///
/// ```
/// use takeoff_llm::MockProvider;
/// use takeoff_domain::VisionProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("single-line diagram", r#"{"distribution_boards": []}"#);
/// provider.add_error("lighting layout");
///
/// let sld = provider.call_vision(&[], "Read this single-line diagram", 8192).unwrap();
/// assert!(sld.text.contains("distribution_boards"));
/// assert!(provider.call_vision(&[], "Read this lighting layout", 8192).is_err());
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    tokens_per_call: u64,
    cost_per_call: f64,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// One recorded call to a [`MockProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Prompt text
    pub prompt: String,
    /// Number of images attached
    pub image_count: usize,
    /// Requested output budget
    pub max_output_tokens: u32,
}

const ERROR_SENTINEL: &str = "ERROR";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-vision".to_string(),
            default_response: response.into(),
            tokens_per_call: 0,
            cost_per_call: 0.0,
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the model name reported by this provider
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the usage reported for every call
    pub fn with_usage(mut self, tokens_per_call: u64, cost_per_call: f64) -> Self {
        self.tokens_per_call = tokens_per_call;
        self.cost_per_call = cost_per_call;
        self
    }

    /// Add a response for prompts containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((key.into(), response.into()));
    }

    /// Configure to return an error for prompts containing `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        lock(&self.responses).push((key.into(), ERROR_SENTINEL.to_string()));
    }

    /// Get the number of times call_vision was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Recorded calls in order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Reset the recorded calls
    pub fn reset_call_count(&self) {
        lock(&self.calls).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl VisionProvider for MockProvider {
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
        lock(&self.calls).push(MockCall {
            prompt: prompt.to_string(),
            image_count: images.len(),
            max_output_tokens,
        });

        let text = lock(&self.responses)
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone());

        if text == ERROR_SENTINEL {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        Ok(VisionResponse {
            text,
            tokens_used: self.tokens_per_call,
            cost: self.cost_per_call,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageRef {
        ImageRef::new("image/png", "aGVsbG8=")
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.call_vision(&[], "any prompt", 100);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().text, "Test response");
    }

    #[test]
    fn test_mock_provider_keyed_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.call_vision(&[], "say hello", 10).unwrap().text, "world");
        assert_eq!(provider.call_vision(&[], "foo?", 10).unwrap().text, "bar");
        assert_eq!(provider.call_vision(&[], "unknown", 10).unwrap().text, "{}");
    }

    #[test]
    fn test_mock_provider_records_calls() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.call_vision(&[image(), image()], "prompt1", 8192).unwrap();
        provider.call_vision(&[], "prompt2", 4096).unwrap();
        assert_eq!(provider.call_count(), 2);

        let calls = provider.calls();
        assert_eq!(calls[0].image_count, 2);
        assert_eq!(calls[1].max_output_tokens, 4096);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.call_vision(&[], "a bad prompt", 10);
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[test]
    fn test_mock_provider_usage() {
        let provider = MockProvider::new("ok").with_usage(1200, 0.04).with_model("mock-large");
        let response = provider.call_vision(&[], "x", 10).unwrap();
        assert_eq!(response.tokens_used, 1200);
        assert_eq!(response.cost, 0.04);
        assert_eq!(provider.model_name(), "mock-large");
    }

    #[test]
    fn test_mock_provider_clone_shares_calls() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.call_vision(&[], "test", 10).unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
