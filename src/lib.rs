//! # loadsheet
//!
//! Extract "DESIGNED APPURTENANCE LOADING" tables from tower-drawing images
//! using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Tower-loading documentation frequently exists only as scanned drawings.
//! The appurtenance table on those sheets — equipment type, quantity,
//! carrier, mounting elevation — is what structural reviews actually need,
//! and classic OCR mangles its two-column layout and parenthetical markers.
//! Instead this crate sends each image to a VLM that reads the table as a
//! human would, then defensively parses the model's JSON answer into a
//! canonical row set written as both `.xlsx` and `.json`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images/
//!  │
//!  ├─ 1. Input      enumerate *.png / *.jpg / *.jpeg (sorted)
//!  ├─ 2. Encode     file bytes → base64 ImageData
//!  ├─ 3. VLM        one call per image (gemini-2.5-flash by default)
//!  ├─ 4. Parse      strip fences, bracket-scan, strict JSON decode
//!  ├─ 5. Normalize  renumber Serial, canonical column order
//!  └─ 6. Output     <base>.xlsx + <base>.json per image
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use loadsheet::{run_batch, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let output = run_batch("DA_Loading_OCR", &config).await?;
//!     println!(
//!         "{}/{} images extracted, {} rows",
//!         output.stats.extracted_images,
//!         output.stats.total_images,
//!         output.stats.total_rows
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `loadsheet` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! loadsheet = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_image, resolve_provider, run_batch, DEFAULT_MODEL};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ImageError, LoadsheetError};
pub use output::{BatchOutput, BatchStats, ImageResult, OutputPaths};
pub use parse::{parse_records, ParseError, Record};
pub use pipeline::llm::{ModelCallError, ModelReply, ProviderClient, VisionModel};
pub use table::{normalize, LoadingTable, CANONICAL_COLUMNS};
