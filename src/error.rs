use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Please select a valid directory. ({path}: {source})")]
    InvalidDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Processing cancelled: {directory} already exists")]
    OverwriteDeclined { directory: PathBuf },

    #[error("Image error for {path}: {source}")]
    ImageIo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name: {0}")]
    InvalidFileName(PathBuf),

    #[error("A batch is already running")]
    BatchAlreadyRunning,

    #[error("Background worker is not available")]
    WorkerUnavailable,
}

impl CompositorError {
    /// True for the user-initiated stop, which is reported as a cancellation rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CompositorError::OverwriteDeclined { .. })
    }
}
