//! Error types for the loadsheet library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LoadsheetError`] — **Fatal**: the run cannot proceed at all (input
//!   directory missing, provider not configured, output directory cannot be
//!   created). Returned as `Err(LoadsheetError)` from the top-level batch
//!   functions before any image is processed.
//!
//! * [`ImageError`] — **Non-fatal**: a single image failed (model call error,
//!   unparseable response, empty extraction) but all other images are fine.
//!   Stored inside [`crate::output::ImageResult`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad scan.
//!
//! One bad image must never abort processing of subsequent images; outputs
//! already written for prior images remain valid.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the loadsheet library.
///
/// Per-image failures use [`ImageError`] and are stored in
/// [`crate::output::ImageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum LoadsheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// The input path exists but is not a directory.
    #[error("Input path '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// Could not list the input directory.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// Stored alongside [`crate::output::ImageResult`] when an image fails.
/// The overall batch always continues to the next image.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The image file could not be read from disk.
    #[error("'{file}': failed to read image: {detail}")]
    ReadFailed { file: String, detail: String },

    /// The model invocation itself failed (auth, network, quota).
    #[error("'{file}': model call failed: {detail}")]
    LlmFailed { file: String, detail: String },

    /// The response text contained no locatable or parseable JSON array.
    #[error("'{file}': malformed model response: {detail}")]
    MalformedResponse { file: String, detail: String },

    /// Zero rows recovered — nothing to write for this image.
    #[error("'{file}': no rows extracted")]
    EmptyExtraction { file: String },

    /// Filesystem error while writing the spreadsheet or JSON output.
    #[error("'{file}': failed to write output '{path}': {detail}")]
    WriteFailed {
        file: String,
        path: String,
        detail: String,
    },
}

impl ImageError {
    /// The source image file this error belongs to.
    pub fn file(&self) -> &str {
        match self {
            ImageError::ReadFailed { file, .. }
            | ImageError::LlmFailed { file, .. }
            | ImageError::MalformedResponse { file, .. }
            | ImageError::EmptyExtraction { file }
            | ImageError::WriteFailed { file, .. } => file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_response_display() {
        let e = ImageError::MalformedResponse {
            file: "tower_a.png".into(),
            detail: "no JSON array found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tower_a.png"), "got: {msg}");
        assert!(msg.contains("no JSON array"), "got: {msg}");
    }

    #[test]
    fn empty_extraction_display() {
        let e = ImageError::EmptyExtraction {
            file: "site42.jpg".into(),
        };
        assert!(e.to_string().contains("site42.jpg"));
        assert!(e.to_string().contains("no rows"));
    }

    #[test]
    fn image_error_file_accessor() {
        let e = ImageError::LlmFailed {
            file: "x.png".into(),
            detail: "HTTP 429".into(),
        };
        assert_eq!(e.file(), "x.png");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = LoadsheetError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "Set GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn invalid_config_display() {
        let e = LoadsheetError::InvalidConfig("temperature out of range".into());
        assert!(e.to_string().contains("temperature"));
    }
}
