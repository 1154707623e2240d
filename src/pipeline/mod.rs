//! Pipeline stages for image-to-table extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different output format) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ parse ──▶ normalize ──▶ write
//! (dir)    (base64)   (VLM)   (records)  (table)      (xlsx+json)
//! ```
//!
//! 1. [`input`]  — enumerate image files in the source directory
//! 2. [`encode`] — read bytes, base64-wrap, tag with media type
//! 3. [`llm`]    — drive the vision-model call; the only stage with network I/O
//! 4. [`crate::parse`] / [`crate::table`] — recover and canonicalise records
//! 5. [`write`]  — spreadsheet + JSON output pair

pub mod encode;
pub mod input;
pub mod llm;
pub mod write;
