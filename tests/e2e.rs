//! End-to-end integration tests for loadsheet.
//!
//! The live tests use real table images in `./test_cases/` and make real
//! vision-LLM API calls. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions};
use loadsheet::{
    run_batch, ExtractionConfig, ImageError, ModelCallError, ModelReply, VisionModel,
    CANONICAL_COLUMNS,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* the image directory is absent.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test directory not found: {}", p.display());
            return;
        }
        p
    }};
}

// ── Offline tests (no API key required) ─────────────────────────────────────

#[tokio::test]
async fn empty_directory_completes_with_empty_report() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = ExtractionConfig::builder()
        .output_dir(out.path())
        .build()
        .unwrap();

    let output = run_batch(dir.path(), &config).await.unwrap();
    assert_eq!(output.stats.total_images, 0);
    assert_eq!(output.stats.extracted_images, 0);
    assert!(output.results.is_empty());
}

#[tokio::test]
async fn missing_directory_is_fatal() {
    let config = ExtractionConfig::default();
    let err = run_batch("/no/such/image/dir", &config).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {err}");
}

/// Replays one canned response per chat call; images are processed in sorted
/// file-name order, so reply N goes to the Nth image.
struct ScriptedModel {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<ModelReply, ModelCallError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelReply {
            text: self.replies[i].clone(),
            input_tokens: 42,
            output_tokens: 7,
        })
    }
}

#[tokio::test]
async fn one_bad_response_does_not_abort_the_batch() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::write(dir.path().join("site_a.png"), b"\x89PNG\r\n\x1a\n").unwrap();
    std::fs::write(dir.path().join("site_b.png"), b"\x89PNG\r\n\x1a\n").unwrap();

    let model = ScriptedModel::new(&[
        r#"[{"Qty": 2, "Type": "Commscope NHH-65C-R2B w/MP", "Carrier": "Verizon", "Elevation": 195}]"#,
        "The image does not appear to contain a loading table.",
    ]);

    let config = ExtractionConfig::builder()
        .provider(model)
        .output_dir(out.path())
        .build()
        .unwrap();

    let output = run_batch(dir.path(), &config).await.unwrap();

    // The malformed second response must not cost the first image its output.
    assert_eq!(output.stats.total_images, 2);
    assert_eq!(output.stats.extracted_images, 1);
    assert_eq!(output.stats.failed_images, 1);
    assert_eq!(output.stats.total_rows, 1);

    let good = &output.results[0];
    assert!(good.succeeded(), "got: {:?}", good.error);
    let paths = good.outputs.as_ref().unwrap();
    assert!(paths.xlsx.exists());
    assert!(paths.json.exists());
    let rows: Vec<loadsheet::Record> =
        serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    assert_eq!(rows[0]["Serial"].as_u64(), Some(1));
    assert_eq!(rows[0]["Type"], "Commscope NHH-65C-R2B w/MP");

    let bad = &output.results[1];
    assert_eq!(bad.file, "site_b.png");
    assert!(
        matches!(bad.error, Some(ImageError::MalformedResponse { .. })),
        "got: {:?}",
        bad.error
    );
    assert!(bad.outputs.is_none());
}

// ── Live tests (E2E_ENABLED + an API key) ───────────────────────────────────

#[tokio::test]
async fn batch_extracts_sample_images() {
    let images = e2e_skip_unless_ready!(test_cases_dir());
    let out = TempDir::new().unwrap();
    let config = ExtractionConfig::builder()
        .output_dir(out.path())
        .build()
        .unwrap();

    let output = run_batch(&images, &config)
        .await
        .expect("batch should complete");

    assert!(output.stats.total_images > 0, "no test images found");
    // Per-image failures are tolerated; the run itself must finish and
    // report one outcome per image.
    assert_eq!(output.results.len(), output.stats.total_images);

    for result in output.results.iter().filter(|r| r.succeeded()) {
        let paths = result.outputs.as_ref().unwrap();
        assert!(paths.xlsx.exists(), "missing {}", paths.xlsx.display());
        assert!(paths.json.exists(), "missing {}", paths.json.display());

        let rows: Vec<loadsheet::Record> =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(rows.len(), result.rows);

        // Serial must be 1..N in order, and columns must lead with the
        // canonical subset.
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row["Serial"].as_u64(), Some(i as u64 + 1));
        }
        let first_keys: Vec<&str> = rows[0].keys().map(|k| k.as_str()).collect();
        let canonical_present: Vec<&str> = CANONICAL_COLUMNS
            .iter()
            .copied()
            .filter(|c| first_keys.contains(c))
            .collect();
        assert!(
            first_keys.starts_with(&canonical_present),
            "canonical columns must come first, got {first_keys:?}"
        );

        println!("✓ {}  {} rows", result.file, result.rows);
    }
}
