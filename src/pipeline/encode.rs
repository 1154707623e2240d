//! Image encoding: file bytes → base64 `ImageData` tagged with media type.
//!
//! VLM APIs accept images as base64 payloads embedded in the JSON request
//! body. The scans are sent exactly as stored on disk — no re-encoding, no
//! resizing — so whatever resolution the drawing was captured at is what the
//! model sees. `detail: "high"` instructs GPT-4-class models to use the full
//! image tile budget; without it the fine print in loading tables is lost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::path::Path;
use tracing::debug;

/// Read an image file and wrap it as a base64 payload for the VLM API.
///
/// The media type is derived from the file extension (`image/png`,
/// `image/jpeg`); the batch driver only feeds paths that already passed the
/// extension filter.
pub fn encode_image(path: &Path) -> std::io::Result<ImageData> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let b64 = STANDARD.encode(&bytes);
    debug!(
        "Encoded {} → {} bytes base64 ({})",
        path.display(),
        b64.len(),
        mime
    );

    Ok(ImageData::new(b64, mime.essence_str()).with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn encode_png_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.png");
        // Minimal PNG header is enough — the encoder does not decode pixels.
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        drop(f);

        let data = encode_image(&path).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[test]
    fn jpeg_gets_jpeg_media_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.JPG");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let data = encode_image(&path).unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(encode_image(Path::new("/no/such/file.png")).is_err());
    }
}
