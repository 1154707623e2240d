//! Batch driving: one directory of table images in, one report out.
//!
//! Images are handled one at a time, in sorted file-name order. Every
//! per-image failure is isolated — the result records it and the loop moves
//! on — so one bad scan never costs the rest of the batch. Extractions are
//! independent across images (no shared state), which also means the loop
//! could be parallelised later without correctness changes; sequential keeps
//! the tool inside any single-key API rate limit.

use crate::config::ExtractionConfig;
use crate::error::{ImageError, LoadsheetError};
use crate::output::{BatchOutput, ImageResult};
use crate::parse;
use crate::pipeline::llm::{ProviderClient, VisionModel};
use crate::pipeline::{encode, input, llm, write};
use crate::table::{normalize, LoadingTable};
use edgequake_llm::ProviderFactory;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract all loading tables from the images in `input_dir`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchOutput)` on completion, even when individual images failed
/// (check `output.stats.failed_images`).
///
/// # Errors
/// Returns `Err(LoadsheetError)` only for run-level failures: missing input
/// directory, no provider configured, or the output directory could not be
/// created.
pub async fn run_batch(
    input_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<BatchOutput, LoadsheetError> {
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    info!("Starting extraction batch: {}", input_dir.display());

    let images = input::list_images(input_dir)?;
    if images.is_empty() {
        warn!("No image files found in {}", input_dir.display());
        return Ok(BatchOutput::from_results(
            Vec::new(),
            start.elapsed().as_millis() as u64,
        ));
    }

    let provider = resolve_provider(config).await?;
    ensure_output_dir(&config.output_dir)?;

    let mut results = Vec::with_capacity(images.len());
    for path in &images {
        info!("Processing {}…", input::base_name(path));
        let result = process_image(&provider, path, config).await;
        if let Some(ref e) = result.error {
            warn!("{e}");
        }
        results.push(result);
    }

    let output = BatchOutput::from_results(results, start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} images extracted, {} rows, {}ms",
        output.stats.extracted_images,
        output.stats.total_images,
        output.stats.total_rows,
        output.stats.total_duration_ms
    );
    Ok(output)
}

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<(), LoadsheetError> {
    std::fs::create_dir_all(dir).map_err(|e| LoadsheetError::OutputDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Run the full pipeline for a single image and write its output pair.
///
/// Always returns an `ImageResult` — never propagates an error upward, so a
/// single bad image doesn't abort the batch. The output directory must
/// already exist (see [`ensure_output_dir`]).
pub async fn process_image(
    provider: &Arc<dyn VisionModel>,
    path: &Path,
    config: &ExtractionConfig,
) -> ImageResult {
    let start = Instant::now();
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let mut result = ImageResult {
        file: file.clone(),
        rows: 0,
        outputs: None,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        error: None,
    };

    let table = match extract_table(provider, &file, path, config).await {
        Ok((table, input_tokens, output_tokens)) => {
            result.input_tokens = input_tokens;
            result.output_tokens = output_tokens;
            table
        }
        Err(e) => {
            result.error = Some(e);
            result.duration_ms = start.elapsed().as_millis() as u64;
            return result;
        }
    };

    if table.is_empty() {
        result.error = Some(ImageError::EmptyExtraction { file });
        result.duration_ms = start.elapsed().as_millis() as u64;
        return result;
    }

    result.rows = table.len();
    let base = input::base_name(path);
    match write::write_outputs(&table, &base, &config.output_dir) {
        Ok(paths) => result.outputs = Some(paths),
        Err(e) => {
            result.error = Some(ImageError::WriteFailed {
                file,
                path: e.path.display().to_string(),
                detail: e.detail,
            });
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    result
}

/// Orchestrate a single image: encode, call the model, parse, normalize.
///
/// Returns the canonical table plus token counts from the model call.
pub async fn extract_table(
    provider: &Arc<dyn VisionModel>,
    file: &str,
    path: &Path,
    config: &ExtractionConfig,
) -> Result<(LoadingTable, u32, u32), ImageError> {
    let image = encode::encode_image(path).map_err(|e| ImageError::ReadFailed {
        file: file.to_string(),
        detail: e.to_string(),
    })?;

    let response = llm::request_extraction(provider, file, image, config).await?;

    let records = parse::parse_records(&response.text).map_err(|e| {
        ImageError::MalformedResponse {
            file: file.to_string(),
            detail: e.to_string(),
        }
    })?;

    Ok((
        normalize(records),
        response.input_tokens,
        response.output_tokens,
    ))
}

/// Resolve the model backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.provider`) — the caller constructed and
///    configured it entirely; used as-is. This is how tests inject scripted
///    [`VisionModel`] implementations.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …) from the
///    environment.
///
/// 3. **Gemini key in the environment** — the loading sheets this tool was
///    built around are read with Gemini, so `GEMINI_API_KEY` wins when
///    multiple keys are present and nothing was named explicitly.
///
/// 4. **Full auto-detection** — the factory scans all known API key
///    variables and picks the first available provider.
pub async fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<Arc<dyn VisionModel>, LoadsheetError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider(name, model);
    }

    if let Ok(gemini_key) = std::env::var("GEMINI_API_KEY") {
        if !gemini_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_vision_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| LoadsheetError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderClient(llm_provider)))
}

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn VisionModel>, LoadsheetError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        LoadsheetError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderClient(provider)))
}
