//! Configuration for a table-extraction run.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, serialise them for logging, and diff two runs
//! to understand why their outputs differ.
//!
//! The model credential is deliberately *not* a field here: provider
//! construction reads it from the environment (or the caller passes a
//! pre-built provider), so the core pipeline stays testable without
//! environment mutation.

use crate::error::LoadsheetError;
use crate::pipeline::llm::VisionModel;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for extracting loading tables from a directory of images.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use loadsheet::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.5-flash")
///     .temperature(0.2)
///     .output_dir("Output")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected from the
    /// environment, preferring `GEMINI_API_KEY`.
    pub provider_name: Option<String>,

    /// Pre-constructed model backend. Takes precedence over `provider_name`.
    ///
    /// Wrap an `edgequake-llm` provider in
    /// [`ProviderClient`](crate::pipeline::llm::ProviderClient), or pass any
    /// other [`VisionModel`] implementation (tests use scripted ones).
    pub provider: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature for the extraction call. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to what it sees in the table
    /// image — transcription wants determinism, not creativity.
    pub temperature: f32,

    /// Maximum tokens the model may generate per image. Default: 4096.
    ///
    /// Dense two-column tables can run past 40 rows; setting this too low
    /// truncates the JSON array mid-record, which surfaces as a malformed
    /// response for the whole image.
    pub max_tokens: usize,

    /// Custom extraction prompt. If None, uses
    /// [`crate::prompts::DEFAULT_EXTRACTION_PROMPT`].
    pub prompt: Option<String>,

    /// Directory to write `<base>.xlsx` / `<base>.json` pairs into.
    /// Created if absent. Default: `Output`.
    pub output_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            prompt: None,
            output_dir: PathBuf::from("Output"),
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn VisionModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn VisionModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, LoadsheetError> {
        let c = &self.config;
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(LoadsheetError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_tokens == 0 {
            return Err(LoadsheetError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(LoadsheetError::InvalidConfig(
                "output_dir must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.output_dir, PathBuf::from("Output"));
        assert!(c.model.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ExtractionConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let err = ExtractionConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn empty_output_dir_rejected() {
        let err = ExtractionConfig::builder().output_dir("").build().unwrap_err();
        assert!(err.to_string().contains("output_dir"));
    }

    #[test]
    fn debug_omits_provider_internals() {
        let c = ExtractionConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("ExtractionConfig"));
    }
}
