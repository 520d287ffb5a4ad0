// src/llm/mod.rs

//! Content-generation service used to write exam questions.

use async_trait::async_trait;

use crate::error::AppError;

pub mod openai;

pub use openai::OpenAiClient;

/// Opaque text completion: instructions in, raw reply text out.
///
/// The reply is expected, but not guaranteed, to be JSON. Transport and API
/// failures are reported as `AppError::UpstreamCallFailed`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_prompt: &str)
    -> Result<String, AppError>;
}
