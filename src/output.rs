//! Per-run report types: what happened to each image, and batch totals.
//!
//! A batch never fails because one image failed — instead every image yields
//! an [`ImageResult`] whose `error` field records the outcome. Callers (and
//! the CLI's `--json` mode) get the full picture of partial success.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Paths of the output pair written for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    pub xlsx: PathBuf,
    pub json: PathBuf,
}

/// Outcome of processing a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// Source image file name (no directory).
    pub file: String,

    /// Rows extracted and normalized for this image.
    pub rows: usize,

    /// Where the spreadsheet/JSON pair landed; `None` when nothing was
    /// written (empty extraction or failure).
    pub outputs: Option<OutputPaths>,

    /// Prompt tokens consumed by the model call.
    pub input_tokens: u32,

    /// Completion tokens produced by the model call.
    pub output_tokens: u32,

    /// Wall-clock time spent on this image.
    pub duration_ms: u64,

    /// `None` on success; the per-image failure otherwise.
    pub error: Option<ImageError>,
}

impl ImageResult {
    /// `true` when the image produced output files.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.outputs.is_some()
    }
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Image files enumerated in the input directory.
    pub total_images: usize,
    /// Images whose output pair was written.
    pub extracted_images: usize,
    /// Images that yielded zero rows (nothing written, warning reported).
    pub empty_images: usize,
    /// Images that failed (model call, parse, read, or write error).
    pub failed_images: usize,
    /// Rows written across all images.
    pub total_rows: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// Full result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Per-image outcomes, in processing (sorted file-name) order.
    pub results: Vec<ImageResult>,
    /// Aggregate totals.
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Build a report from per-image outcomes.
    pub fn from_results(results: Vec<ImageResult>, total_duration_ms: u64) -> Self {
        let stats = BatchStats {
            total_images: results.len(),
            extracted_images: results.iter().filter(|r| r.succeeded()).count(),
            empty_images: results
                .iter()
                .filter(|r| matches!(r.error, Some(ImageError::EmptyExtraction { .. })))
                .count(),
            failed_images: results
                .iter()
                .filter(|r| {
                    matches!(
                        r.error,
                        Some(ImageError::ReadFailed { .. })
                            | Some(ImageError::LlmFailed { .. })
                            | Some(ImageError::MalformedResponse { .. })
                            | Some(ImageError::WriteFailed { .. })
                    )
                })
                .count(),
            total_rows: results.iter().map(|r| r.rows).sum(),
            total_input_tokens: results.iter().map(|r| r.input_tokens as u64).sum(),
            total_output_tokens: results.iter().map(|r| r.output_tokens as u64).sum(),
            total_duration_ms,
        };
        Self { results, stats }
    }
}
