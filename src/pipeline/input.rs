//! Input enumeration: find the image files to process in a directory.
//!
//! Directory-listing order is filesystem-dependent, so the listing is sorted
//! by file name to keep run output reproducible across machines.

use crate::error::LoadsheetError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions treated as processable table images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// `true` when the path carries a recognised image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// List the image files in `dir`, sorted by file name.
///
/// Non-matching entries (other extensions, subdirectories) are ignored.
///
/// # Errors
/// Fails when `dir` does not exist, is not a directory, or cannot be read.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, LoadsheetError> {
    if !dir.exists() {
        return Err(LoadsheetError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(LoadsheetError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| LoadsheetError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();

    images.sort();
    debug!("Found {} image files in {}", images.len(), dir.display());
    Ok(images)
}

/// Derive the output base name from an image path: file name, extension
/// stripped. `tower_a.PNG` → `tower_a`.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image_file(Path::new("a.png")));
        assert!(is_image_file(Path::new("b.JPG")));
        assert!(is_image_file(Path::new("c.Jpeg")));
        assert!(!is_image_file(Path::new("d.pdf")));
        assert!(!is_image_file(Path::new("e.png.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn listing_is_filtered_and_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta.png", "alpha.JPG", "notes.txt", "beta.jpeg", "scan.tiff"] {
            File::create(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let images = list_images(dir.path()).unwrap();
        let names: Vec<String> = images.iter().map(|p| base_name(p)).collect();
        assert_eq!(names, ["alpha", "beta", "zeta"]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let err = list_images(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, LoadsheetError::InputDirNotFound { .. }));
    }

    #[test]
    fn file_as_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.png");
        File::create(&file).unwrap();
        let err = list_images(&file).unwrap_err();
        assert!(matches!(err, LoadsheetError::NotADirectory { .. }));
    }

    #[test]
    fn base_name_strips_extension_only() {
        assert_eq!(base_name(Path::new("/x/tower_a.site4.png")), "tower_a.site4");
        assert_eq!(base_name(Path::new("scan.JPEG")), "scan");
    }
}
