//! CLI binary for loadsheet.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, drives the per-image loop, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use loadsheet::pipeline::input;
use loadsheet::{batch, BatchOutput, ExtractionConfig, ImageError, ImageResult};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every table image in a directory (outputs land in ./Output)
  loadsheet DA_Loading_OCR

  # Choose the output directory
  loadsheet scans/ -o extracted/

  # Use a specific model
  loadsheet scans/ --provider gemini --model gemini-2.5-pro

  # Machine-readable run report
  loadsheet scans/ --json > report.json

OUTPUT:
  For each image <name>.png that yields rows, two files are written:
    <output-dir>/<name>.xlsx   spreadsheet, header row: Serial, Qty, Type, Carrier, Elevation
    <output-dir>/<name>.json   same rows as a pretty-printed JSON array
  Images that fail extraction or contain no rows produce no files; the run
  continues and reports them in the summary.

SUPPORTED PROVIDERS:
  gemini (default when GEMINI_API_KEY is set), openai, anthropic, and any
  other provider edgequake-llm can construct from the environment.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Google Gemini API key (preferred)
  OPENAI_API_KEY       OpenAI API key
  ANTHROPIC_API_KEY    Anthropic API key
  LOADSHEET_MODEL      Override model ID
  LOADSHEET_PROVIDER   Override provider name

SETUP:
  1. Set API key:  export GEMINI_API_KEY=...
  2. Extract:      loadsheet path/to/images
"#;

/// Extract DESIGNED APPURTENANCE LOADING tables from images using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "loadsheet",
    version,
    about = "Extract DESIGNED APPURTENANCE LOADING tables from images using Vision LLMs",
    long_about = "Extract the appurtenance-loading table (equipment type, quantity, carrier, \
elevation) from scanned tower-drawing images. Each image becomes one spreadsheet and one JSON \
file. Supports Google Gemini, OpenAI, Anthropic, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing table images (.png, .jpg, .jpeg).
    input_dir: PathBuf,

    /// Directory to write the .xlsx/.json pairs into (created if absent).
    #[arg(short, long, env = "LOADSHEET_OUTPUT", default_value = "Output")]
    output: PathBuf,

    /// Vision LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "LOADSHEET_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, …
    #[arg(
        long,
        env = "LOADSHEET_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set; \
          GEMINI_API_KEY is preferred when several keys are present."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0). Low values keep transcription faithful.
    #[arg(long, env = "LOADSHEET_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per image.
    #[arg(long, env = "LOADSHEET_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long, env = "LOADSHEET_PROMPT")]
    prompt: Option<PathBuf>,

    /// Output a structured JSON run report instead of status lines.
    #[arg(long, env = "LOADSHEET_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "LOADSHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LOADSHEET_QUIET")]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LOADSHEET_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when status lines are active; they
    // already carry all the feedback that matters to the user.
    let show_status = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_status {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Enumerate and prepare ────────────────────────────────────────────
    let images = input::list_images(&cli.input_dir)
        .with_context(|| format!("Cannot list images in {:?}", cli.input_dir))?;

    if images.is_empty() {
        if !cli.quiet {
            println!(
                "{} No image files (.png/.jpg/.jpeg) found in {}",
                yellow("⚠"),
                cli.input_dir.display()
            );
        }
        return Ok(());
    }

    let provider = batch::resolve_provider(&config)
        .await
        .context("No vision LLM provider available")?;
    batch::ensure_output_dir(&config.output_dir)
        .context("Cannot create output directory")?;

    // ── Per-image loop ───────────────────────────────────────────────────
    // Status lines and the bar share stdout; stderr stays reserved for logs
    // and fatal errors.
    let bar = if show_status && !cli.no_progress {
        let b = ProgressBar::with_draw_target(Some(images.len() as u64), ProgressDrawTarget::stdout());
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        b.set_prefix("Extracting");
        b.enable_steady_tick(Duration::from_millis(80));
        Some(b)
    } else {
        None
    };

    let println_via = |line: String| match &bar {
        Some(b) => b.println(line),
        None if show_status => println!("{line}"),
        None => {}
    };

    let start = Instant::now();
    let mut results: Vec<ImageResult> = Vec::with_capacity(images.len());

    for path in &images {
        if let Some(ref b) = bar {
            b.set_message(input::base_name(path));
        }
        let result = batch::process_image(&provider, path, &config).await;
        println_via(render_result_line(&result));
        if let Some(ref b) = bar {
            b.inc(1);
        }
        results.push(result);
    }

    if let Some(b) = bar {
        b.finish_and_clear();
    }

    let output = BatchOutput::from_results(results, start.elapsed().as_millis() as u64);

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise run report")?
        );
    } else if !cli.quiet {
        print_summary(&output, &config.output_dir);
    }

    Ok(())
}

/// One status line per processed image: green tick for saved, yellow
/// warning for empty, red cross for failed.
fn render_result_line(result: &ImageResult) -> String {
    let secs = format!("{:.1}s", result.duration_ms as f64 / 1000.0);
    match &result.error {
        None => format!(
            "  {} {:<28} {:>3} rows   {}",
            green("✓"),
            result.file,
            result.rows,
            dim(&secs),
        ),
        Some(ImageError::EmptyExtraction { .. }) => format!(
            "  {} {:<28} no data extracted   {}",
            yellow("⚠"),
            result.file,
            dim(&secs),
        ),
        Some(e) => {
            let msg = truncate_chars(&e.to_string(), 80);
            format!("  {} {:<28} {}", red("✗"), result.file, red(&msg))
        }
    }
}

/// Cap a message at `max` characters, ellipsised. Cuts on character
/// boundaries so multi-byte text (accented file names, provider error
/// prose) never lands mid-codepoint.
fn truncate_chars(msg: &str, max: usize) -> String {
    match msg.char_indices().nth(max - 1) {
        Some((idx, _)) if msg[idx..].chars().nth(1).is_some() => {
            format!("{}\u{2026}", &msg[..idx])
        }
        _ => msg.to_string(),
    }
}

fn print_summary(output: &BatchOutput, output_dir: &std::path::Path) {
    let s = &output.stats;
    let mark = if s.failed_images == 0 {
        green("✔")
    } else if s.extracted_images == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    println!(
        "{mark} {}/{} images extracted  →  {}",
        bold(&s.extracted_images.to_string()),
        s.total_images,
        bold(&output_dir.display().to_string()),
    );
    if s.empty_images > 0 {
        println!("   {} images with no data", yellow(&s.empty_images.to_string()));
    }
    if s.failed_images > 0 {
        println!("   {} images failed", red(&s.failed_images.to_string()));
    }
    println!(
        "   {} rows  —  {} tokens in / {} tokens out  —  {}ms total",
        s.total_rows,
        dim(&s.total_input_tokens.to_string()),
        dim(&s.total_output_tokens.to_string()),
        s.total_duration_ms,
    );
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let prompt = if let Some(ref path) = cli.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .output_dir(cli.output.clone());

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name.as_str());
    }
    if let Some(p) = prompt {
        builder = builder.prompt(p);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(file: &str, detail: String) -> ImageResult {
        ImageResult {
            file: file.to_string(),
            rows: 0,
            outputs: None,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 1200,
            error: Some(ImageError::LlmFailed {
                file: file.to_string(),
                detail,
            }),
        }
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        // Accented text places multi-byte chars across the cut point; a byte
        // slice here would panic mid-codepoint.
        let msg = format!("'café_tower_scan.png': {}", "é".repeat(100));
        let cut = truncate_chars(&msg, 80);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with('\u{2026}'));
    }

    #[test]
    fn short_and_exact_length_messages_pass_through() {
        assert_eq!(truncate_chars("timeout", 80), "timeout");
        let exact = "x".repeat(80);
        assert_eq!(truncate_chars(&exact, 80), exact);
    }

    #[test]
    fn failure_line_renders_non_ascii_errors() {
        let line = render_result_line(&failed("café.png", "é".repeat(90)));
        assert!(line.contains("café.png"));
        assert!(line.contains('\u{2026}'));
    }

    #[test]
    fn failure_line_keeps_short_errors_whole() {
        let line = render_result_line(&failed("site.png", "connection reset".into()));
        assert!(line.contains("connection reset"));
        assert!(!line.contains('\u{2026}'));
    }
}
