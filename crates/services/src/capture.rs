use async_trait::async_trait;
use std::path::{Path, PathBuf};

use classroom_core::model::PhotoRef;

use crate::error::CaptureError;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Supplies the class photo for a marking pass.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Acquire a photo. `Ok(None)` means nothing was chosen.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` if a chosen photo cannot be read.
    async fn acquire(&self) -> Result<Option<PhotoRef>, CaptureError>;
}

/// Loads a local image file as a stand-in for a camera.
#[derive(Debug, Clone, Default)]
pub struct FilePhotoSource {
    path: Option<PathBuf>,
}

impl FilePhotoSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A source where the user picked no file.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[async_trait]
impl PhotoSource for FilePhotoSource {
    async fn acquire(&self) -> Result<Option<PhotoRef>, CaptureError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(None);
        };
        if !is_image(path) {
            return Err(CaptureError::UnsupportedFormat { path: path.clone() });
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| CaptureError::Io {
            path: path.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(CaptureError::EmptyFile { path: path.clone() });
        }
        Ok(Some(PhotoRef::new(path.display().to_string())))
    }
}
