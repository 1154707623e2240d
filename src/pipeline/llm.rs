//! VLM interaction: build the vision message and call the provider.
//!
//! This module converts an encoded table image into a VLM API call and
//! returns the raw response text. It is intentionally thin — all prompt
//! engineering lives in [`crate::prompts`] so it can be changed without
//! touching request or error-handling logic here.
//!
//! One call per image, one attempt: a failed call abandons that image's
//! extraction and the batch moves on. Appurtenance sheets are re-runnable at
//! will, so retry plumbing buys little over simply running the batch again.

use crate::config::ExtractionConfig;
use crate::error::ImageError;
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// The one capability the pipeline needs from a model backend: a vision
/// chat turn in, response text and token counts out.
///
/// `edgequake-llm` providers satisfy it through [`ProviderClient`]; tests
/// drive whole batches with scripted implementations instead.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ModelReply, ModelCallError>;
}

/// One chat turn's answer, before the pipeline attaches timing.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider-side failure, carried as display text.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModelCallError(pub String);

/// Adapter from any `edgequake-llm` provider to [`VisionModel`].
pub struct ProviderClient(pub Arc<dyn LLMProvider>);

#[async_trait]
impl VisionModel for ProviderClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ModelReply, ModelCallError> {
        let response = self
            .0
            .chat(messages, Some(options))
            .await
            .map_err(|e| ModelCallError(e.to_string()))?;
        Ok(ModelReply {
            text: response.content,
            input_tokens: response.prompt_tokens as u32,
            output_tokens: response.completion_tokens as u32,
        })
    }
}

/// Raw model output for one image, with token accounting.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Opaque response text; consumed once by the parser.
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration_ms: u64,
}

/// Ask the vision model to read the loading table out of one image.
///
/// ## Message Layout
///
/// 1. **System message** — the extraction-rule prompt (or caller override)
/// 2. **User message** — the image as a base64 attachment (empty text)
///
/// The empty user text is intentional: VLM APIs require at least one user
/// turn to respond to, but the image carries all the actual content.
pub async fn request_extraction(
    model: &Arc<dyn VisionModel>,
    file: &str,
    image: ImageData,
    config: &ExtractionConfig,
) -> Result<ModelResponse, ImageError> {
    let start = Instant::now();
    let prompt = config.prompt.as_deref().unwrap_or(DEFAULT_EXTRACTION_PROMPT);

    let messages = vec![
        ChatMessage::system(prompt),
        ChatMessage::user_with_images("", vec![image]),
    ];

    let options = build_options(config);

    match model.chat(&messages, &options).await {
        Ok(reply) => {
            let duration = start.elapsed();
            debug!(
                "{}: {} input tokens, {} output tokens, {:?}",
                file, reply.input_tokens, reply.output_tokens, duration
            );
            Ok(ModelResponse {
                text: reply.text,
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
                duration_ms: duration.as_millis() as u64,
            })
        }
        Err(e) => {
            warn!("{}: model call failed — {}", file, e);
            Err(ImageError::LlmFailed {
                file: file.to_string(),
                detail: e.to_string(),
            })
        }
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
