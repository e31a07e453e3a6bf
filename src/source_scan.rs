use crate::error::CompositorError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension matched by the scan. The match is case-sensitive.
pub const SOURCE_EXTENSION: &str = "png";

/// List the source images directly inside `dir`, sorted by file name.
///
/// Subdirectories (including a previous `_BORDERED` output folder) are never descended into.
pub fn list_source_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, CompositorError> {
    let dir = dir.as_ref();
    let invalid = |source: std::io::Error| CompositorError::InvalidDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let entries = fs::read_dir(dir).map_err(invalid)?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.map_err(invalid)?.path();
        if path.is_file() && is_source_image(&path) {
            images.push(path);
        } else {
            debug!("Skipping non-source entry: {}", path.display());
        }
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn is_source_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == SOURCE_EXTENSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_source_image() {
        assert!(is_source_image(Path::new("a.png")));
        assert!(is_source_image(Path::new("dir/multi.part.name.png")));
        assert!(!is_source_image(Path::new("A.PNG"))); // case-sensitive
        assert!(!is_source_image(Path::new("photo.jpg")));
        assert!(!is_source_image(Path::new("png")));
        assert!(!is_source_image(Path::new(".png")));
        assert!(!is_source_image(Path::new("archive.png.zip")));
    }

    #[test]
    fn test_lists_only_top_level_png_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.png"), b"x").unwrap();
        fs::write(root.join("a.png"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join("UPPER.PNG"), b"x").unwrap();
        fs::create_dir(root.join("_BORDERED")).unwrap();
        fs::write(root.join("_BORDERED").join("a_BORDERED.png"), b"x").unwrap();
        fs::create_dir(root.join("folder.png")).unwrap();

        let images = list_source_images(root).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_missing_directory_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let err = list_source_images(&missing).unwrap_err();
        assert!(matches!(err, CompositorError::InvalidDirectory { ref path, .. } if path == &missing));
    }

    #[test]
    fn test_file_path_is_invalid_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.png");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            list_source_images(&file),
            Err(CompositorError::InvalidDirectory { .. })
        ));
    }
}
