use crate::canvas;
use crate::error::CompositorError;
use crate::source_scan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the output folder created next to the source images.
pub const OUTPUT_DIR_NAME: &str = "_BORDERED";
pub const BORDERED_SUFFIX: &str = "_BORDERED";
pub const MONO_SUFFIX: &str = "_MONO";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BorderColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BorderColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl Default for BorderColor {
    fn default() -> Self {
        // Magenta
        Self::new(255, 0, 255)
    }
}

/// One user-triggered run over a directory.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: Uuid,
    pub source_directory: PathBuf,
    pub border_color: BorderColor,
    pub file_list: Vec<PathBuf>,
}

impl BatchJob {
    pub fn new(source_directory: PathBuf, border_color: BorderColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_directory,
            border_color,
            file_list: Vec::new(),
        }
    }

    /// Enumerate the source directory into `file_list`.
    pub fn load_file_list(&mut self) -> Result<usize, CompositorError> {
        self.file_list = source_scan::list_source_images(&self.source_directory)?;
        Ok(self.file_list.len())
    }

    pub fn output_directory(&self) -> PathBuf {
        self.source_directory.join(OUTPUT_DIR_NAME)
    }
}

/// Geometry of a single source image on its padded canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub source_path: PathBuf,
    pub original_width: u32,
    pub original_height: u32,
    pub canvas_width: u32,
}

impl ImageRecord {
    pub fn new(source_path: PathBuf, original_width: u32, original_height: u32) -> Self {
        Self {
            source_path,
            original_width,
            original_height,
            canvas_width: canvas::canvas_width(original_height),
        }
    }

    pub fn offset_x(&self) -> i64 {
        canvas::center_offset(self.canvas_width, self.original_width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPair {
    pub bordered_path: PathBuf,
    pub monochrome_path: PathBuf,
}

impl OutputPair {
    /// `dir/name.ext` maps to `dir/_BORDERED/name_BORDERED.ext` and `dir/_BORDERED/name_MONO.ext`.
    ///
    /// Names are built from the raw `OsStr` parts, so file names that are not valid UTF-8 work too.
    pub fn for_source(source_path: &Path) -> Result<Self, CompositorError> {
        let invalid = || CompositorError::InvalidFileName(source_path.to_path_buf());

        let stem = source_path.file_stem().ok_or_else(invalid)?;
        let extension = source_path.extension().ok_or_else(invalid)?;
        let parent = source_path.parent().unwrap_or_else(|| Path::new(""));
        let output_dir = parent.join(OUTPUT_DIR_NAME);

        let file_name = |suffix: &str| {
            let mut name = OsString::from(stem);
            name.push(suffix);
            name.push(".");
            name.push(extension);
            name
        };

        Ok(Self {
            bordered_path: output_dir.join(file_name(BORDERED_SUFFIX)),
            monochrome_path: output_dir.join(file_name(MONO_SUFFIX)),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub job_id: Uuid,
    pub processed: usize,
    pub outputs: Vec<OutputPair>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Whole-number percentage of `done` out of `total`, rounded half up.
///
/// Reaches exactly 100 when `done == total`, and is 0 for an empty batch.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((done * 100 + total / 2) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_pair_naming() {
        let pair = OutputPair::for_source(Path::new("/photos/a.png")).unwrap();
        assert_eq!(pair.bordered_path, PathBuf::from("/photos/_BORDERED/a_BORDERED.png"));
        assert_eq!(pair.monochrome_path, PathBuf::from("/photos/_BORDERED/a_MONO.png"));
    }

    #[test]
    fn test_output_pair_short_and_dotted_stems() {
        let pair = OutputPair::for_source(Path::new("/p/x.png")).unwrap();
        assert_eq!(pair.bordered_path, PathBuf::from("/p/_BORDERED/x_BORDERED.png"));

        let pair = OutputPair::for_source(Path::new("/p/shot.v2.final.png")).unwrap();
        assert_eq!(pair.monochrome_path, PathBuf::from("/p/_BORDERED/shot.v2.final_MONO.png"));
    }

    #[test]
    fn test_output_pair_requires_extension() {
        assert!(matches!(
            OutputPair::for_source(Path::new("/p/noext")),
            Err(CompositorError::InvalidFileName(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_pair_keeps_non_utf8_stem() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new("/p").join(OsStr::from_bytes(b"caf\xe9.png"));
        let pair = OutputPair::for_source(&source).unwrap();

        assert_eq!(
            pair.bordered_path.file_name().unwrap().as_bytes(),
            b"caf\xe9_BORDERED.png"
        );
        assert_eq!(
            pair.monochrome_path,
            Path::new("/p/_BORDERED").join(OsStr::from_bytes(b"caf\xe9_MONO.png"))
        );
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(2, 2), 100);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(999, 1000), 100);
        assert_eq!(progress_percent(5, 3), 100);
    }

    #[test]
    fn test_progress_percent_is_monotonic_and_ends_at_100() {
        for total in 1..=250 {
            let mut last = 0;
            for done in 1..=total {
                let p = progress_percent(done, total);
                assert!(p >= last);
                last = p;
            }
            assert_eq!(last, 100);
        }
    }

    #[test]
    fn test_image_record_geometry() {
        let record = ImageRecord::new(PathBuf::from("a.png"), 100, 50);
        assert_eq!(record.canvas_width, 118);
        assert_eq!(record.offset_x(), 9);
    }

    #[test]
    fn test_default_border_color_is_magenta() {
        assert_eq!(BorderColor::default().to_rgba(), image::Rgba([255, 0, 255, 255]));
    }
}
