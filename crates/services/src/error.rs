//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use storage::repository::StorageError;

use crate::sessions::FinishedAttendance;

/// Errors emitted by photo sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("unsupported image format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("image file is empty: {}", .path.display())]
    EmptyFile { path: PathBuf },
    #[error("failed to read image {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("completed attendance could not be saved")]
    Unsaved {
        finished: Box<FinishedAttendance>,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
