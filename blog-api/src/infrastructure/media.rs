//! Local-disk storage for uploaded images.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Directory (relative to the media root) that blog images are written to.
pub const BLOG_IMAGE_DIR: &str = "blog_images";

const MAX_STEM_CHARS: usize = 64;

/// A file part received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Formats accepted for blog images.
const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Guesses the format from the content and decodes it in full, so truncated or
/// corrupted files are refused along with files that are not images at all.
pub fn detect_image(bytes: &[u8]) -> Option<ImageFormat> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let format = reader.format().filter(|f| ACCEPTED_FORMATS.contains(f))?;
    match reader.decode() {
        Ok(_) => Some(format),
        Err(e) => {
            debug!(?format, "upload failed to decode: {}", e);
            None
        }
    }
}

/// An upload that decoded as one of the accepted formats.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file: UploadedFile,
    pub format: ImageFormat,
}

impl ImageUpload {
    pub fn new(file: UploadedFile) -> Option<Self> {
        let format = detect_image(&file.bytes)?;
        Some(Self { file, format })
    }

    fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Writes `upload` under `dir` and returns its path relative to the media root.
    pub async fn save(&self, dir: &str, upload: &ImageUpload) -> Result<String, DomainError> {
        let relative = format!("{}/{}_{}", dir, Uuid::new_v4().simple(), safe_filename(upload));
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!("failed to create media directory {}: {}", parent.display(), e);
                DomainError::Internal(format!("media storage error: {}", e))
            })?;
        }
        tokio::fs::write(&target, &upload.file.bytes).await.map_err(|e| {
            error!("failed to write upload {}: {}", target.display(), e);
            DomainError::Internal(format!("media storage error: {}", e))
        })?;

        info!(path = %relative, size = upload.file.bytes.len(), "upload stored");
        Ok(relative)
    }
}

/// Keeps ASCII alphanumerics, `-` and `_` from the client name and forces the
/// extension to the decoded format.
fn safe_filename(upload: &ImageUpload) -> String {
    let name = Path::new(&upload.file.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = if stem.is_empty() { "upload".to_string() } else { stem };

    format!("{}.{}", stem, upload.extension())
}

/// 1x1 RGBA PNG.
#[cfg(test)]
pub(crate) const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0xf8,
    0xcf, 0xc0, 0xf0, 0x1f, 0x00, 0x05, 0x00, 0x01, 0xff, 0x56, 0xc7, 0x2f, 0x0d, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];
