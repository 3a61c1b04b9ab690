//! Anthropic Provider Implementation
//!
//! Sends page images to the Messages API as base64 image blocks followed by a
//! single text block carrying the prompt.

use crate::pricing::Pricing;
use crate::{block_on, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use takeoff_domain::{ImageRef, VisionProvider, VisionResponse};
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Environment variable read for the API key by default
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    pricing: Pricing,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            pricing: Pricing::default(),
        }
    }

    /// Create a provider reading the API key from an environment variable
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(var)
            .map_err(|_| LlmError::Authentication(format!("{} is not set", var)))?;
        if api_key.trim().is_empty() {
            return Err(LlmError::Authentication(format!("{} is empty", var)));
        }
        Ok(Self::new(api_key, model))
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Apply a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Set the rate card used to report cost
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    fn build_request<'a>(
        &'a self,
        images: &'a [ImageRef],
        prompt: &'a str,
        max_output_tokens: u32,
    ) -> MessagesRequest<'a> {
        let mut content: Vec<ContentBlock<'a>> = images
            .iter()
            .map(|image| ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: &image.media_type,
                    data: &image.data,
                },
            })
            .collect();
        content.push(ContentBlock::Text { text: prompt });

        MessagesRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            messages: vec![Message {
                role: "user",
                content,
            }],
        }
    }

    /// Send images and a prompt to the Messages API
    pub async fn create_message(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, LlmError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let body = self.build_request(images, prompt, max_output_tokens);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication(error_text),
                404 => LlmError::ModelNotAvailable(self.model.clone()),
                429 | 529 => LlmError::RateLimitExceeded,
                _ => LlmError::Communication(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let parsed = response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        debug!(
            model = %self.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Anthropic call complete"
        );

        Ok(VisionResponse {
            text,
            tokens_used: parsed.usage.input_tokens + parsed.usage.output_tokens,
            cost: self
                .pricing
                .cost(parsed.usage.input_tokens, parsed.usage.output_tokens),
        })
    }
}

impl VisionProvider for AnthropicProvider {
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
        block_on(self.create_message(images, prompt, max_output_tokens))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_puts_images_before_text() {
        let provider = AnthropicProvider::new("key", "vision-model");
        let images = vec![
            ImageRef::new("image/png", "AAAA"),
            ImageRef::new("image/jpeg", "BBBB"),
        ];
        let request = provider.build_request(&images, "Extract boards", 8192);
        let json = serde_json::to_value(&request).unwrap();

        let content = &json["messages"][0]["content"];
        assert_eq!(content.as_array().unwrap().len(), 3);
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[1]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[2]["type"], "text");
        assert_eq!(content[2]["text"], "Extract boards");
        assert_eq!(json["max_tokens"], 8192);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "content": [{"type": "text", "text": "{\"rooms\": []}"}],
            "usage": {"input_tokens": 1500, "output_tokens": 200}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text, "{\"rooms\": []}");
        assert_eq!(parsed.usage.input_tokens + parsed.usage.output_tokens, 1700);
    }

    #[test]
    fn test_missing_env_key() {
        let result = AnthropicProvider::from_env("TAKEOFF_TEST_UNSET_KEY_VAR", "m");
        assert!(matches!(result, Err(LlmError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_communication_error() {
        let provider = AnthropicProvider::new("key", "m").with_endpoint("http://127.0.0.1:9");
        let result = provider.create_message(&[], "x", 16).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
