//! Trait definitions for external interactions
//!
//! Infrastructure implementations live in other crates.

use crate::page::ImageRef;

/// Reply from a vision-capable model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisionResponse {
    /// Raw response text
    pub text: String,
    /// Input plus output tokens
    pub tokens_used: u64,
    /// Cost of the call in the provider's billing currency
    pub cost: f64,
}

/// Capability to send page images and a prompt to a vision model
///
/// Implemented by the infrastructure layer (takeoff-llm). Calls are
/// synchronous and may fail; callers never assume success.
pub trait VisionProvider {
    /// Error type for provider calls
    type Error;

    /// Model identifier used for reporting
    fn model_name(&self) -> &str;

    /// Send images and a prompt, returning the response text and usage
    fn call_vision(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, Self::Error>;
}

impl<P: VisionProvider + ?Sized> VisionProvider for &P {
    type Error = P::Error;

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn call_vision(
        &self,
        images: &[ImageRef],
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<VisionResponse, Self::Error> {
        (**self).call_vision(images, prompt, max_output_tokens)
    }
}
