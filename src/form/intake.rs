use std::path::{Path, PathBuf};

use crate::error::{GenerationError, Result};

/// Most reference images a single request may carry.
pub const MAX_LOCAL_IMAGES: usize = 8;

/// Extensions the file picker offers besides anything typed `image/*`.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A locally selected file. Contents are only read when a request is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub name: String,
    pub mime_type: Option<String>,
    pub source: ImageSource,
}

impl LocalImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            mime_type: None,
            source: ImageSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            source: ImageSource::Bytes(bytes),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
            ImageSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                GenerationError::Encode(format!("failed to read {}: {}", path.display(), e))
            }),
        }
    }
}

/// File picker filter: `image/*` or one of [`ACCEPTED_EXTENSIONS`].
pub fn accepts(image: &LocalImage) -> bool {
    let typed_image = image
        .mime_type
        .as_deref()
        .map(|mime| mime.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false);
    typed_image
        || image
            .extension()
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
}

/// Reference images for image-to-image: either local files or one URL, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageIntake {
    local_files: Vec<LocalImage>,
    remote_url: Option<String>,
}

impl ImageIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_files(&self) -> &[LocalImage] {
        &self.local_files
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.local_files.iter().map(|file| file.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.local_files.is_empty() && self.remote_url.is_none()
    }

    /// Replaces the selection with the first [`MAX_LOCAL_IMAGES`] candidates
    /// and clears the URL. Returns how many candidates were dropped.
    pub fn select_local_files<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = LocalImage>,
    {
        let mut offered = candidates.into_iter();
        let kept: Vec<LocalImage> = offered.by_ref().take(MAX_LOCAL_IMAGES).collect();
        let dropped = offered.count();

        if dropped > 0 {
            log::warn!(
                "Only the first {} images are kept, {} dropped",
                MAX_LOCAL_IMAGES,
                dropped
            );
        }
        log::debug!("Selected {} local images", kept.len());

        self.local_files = kept;
        self.remote_url = None;
        dropped
    }

    /// Drag-and-drop surface. Same semantics as the file picker.
    pub fn drop_files<I>(&mut self, dropped: I) -> usize
    where
        I: IntoIterator<Item = LocalImage>,
    {
        self.select_local_files(dropped)
    }

    /// Sets the single remote reference and clears local files. A blank URL
    /// leaves the intake with no URL.
    pub fn set_remote_url(&mut self, url: &str) {
        let url = url.trim();
        self.remote_url = if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        };
        self.local_files.clear();
    }

    pub fn clear_local_files(&mut self) {
        self.local_files.clear();
    }

    pub fn clear(&mut self) {
        self.local_files.clear();
        self.remote_url = None;
    }
}
