//! Payment screenshot uploads.
//!
//! Screenshots are written to the configured upload directory under a random
//! name; the order row keeps only that file name.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Largest accepted screenshot.
pub const MAX_SCREENSHOT_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types and the extension they are stored under.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload payment screenshot")]
    Missing,
    #[error("Screenshot must be smaller than 5MB")]
    TooLarge,
    #[error("Please upload a JPG, PNG, WEBP or HEIC image")]
    UnsupportedType(String),
    #[error("Could not save screenshot: {0}")]
    Io(#[from] std::io::Error),
}

/// A checked screenshot waiting to be written.
#[derive(Debug)]
pub struct PaymentScreenshot {
    bytes: Vec<u8>,
    extension: &'static str,
}

impl PaymentScreenshot {
    /// Check an uploaded file's type and size.
    ///
    /// # Errors
    ///
    /// Returns an [`UploadError`] for empty, oversized or non-image uploads.
    pub fn validate(content_type: Option<&str>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if bytes.len() > MAX_SCREENSHOT_BYTES {
            return Err(UploadError::TooLarge);
        }
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
            .unwrap_or_default();
        let extension = ACCEPTED_TYPES
            .iter()
            .find(|(accepted, _)| *accepted == mime)
            .map(|(_, ext)| *ext)
            .ok_or(UploadError::UnsupportedType(mime))?;
        Ok(Self { bytes, extension })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the file and return its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] if the directory cannot be created or written.
    pub async fn save(self, upload_dir: &Path) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(upload_dir).await?;
        let file_name = format!("payment-{}.{}", Uuid::new_v4().simple(), self.extension);
        tokio::fs::write(upload_dir.join(&file_name), &self.bytes).await?;
        tracing::info!(file = %file_name, bytes = self.bytes.len(), "Saved payment screenshot");
        Ok(file_name)
    }
}

/// Resolve a stored screenshot name inside `upload_dir`.
///
/// Returns `None` for names that are not a bare file name.
#[must_use]
pub fn stored_path(upload_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let valid = !file_name.is_empty()
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !file_name.starts_with('.');
    valid.then(|| upload_dir.join(file_name))
}

/// MIME type for serving a stored screenshot.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    ACCEPTED_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map_or("application/octet-stream", |(mime, _)| *mime)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_upload() {
        let err = PaymentScreenshot::validate(Some("image/png"), Vec::new()).unwrap_err();
        assert!(matches!(err, UploadError::Missing));
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let bytes = vec![0; MAX_SCREENSHOT_BYTES + 1];
        let err = PaymentScreenshot::validate(Some("image/jpeg"), bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge));
    }

    #[test]
    fn test_accepts_exact_limit() {
        let bytes = vec![0; MAX_SCREENSHOT_BYTES];
        assert!(PaymentScreenshot::validate(Some("image/webp"), bytes).is_ok());
    }

    #[test]
    fn test_rejects_non_images() {
        let err = PaymentScreenshot::validate(Some("application/pdf"), vec![1]).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(ref t) if t == "application/pdf"));
        assert!(PaymentScreenshot::validate(None, vec![1]).is_err());
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        let shot = PaymentScreenshot::validate(Some("Image/HEIC; charset=binary"), vec![1]).unwrap();
        assert_eq!(shot.extension, "heic");
    }

    #[tokio::test]
    async fn test_save_writes_random_name() {
        let dir = std::env::temp_dir().join(format!("akf-upload-{}", Uuid::new_v4()));
        let shot = PaymentScreenshot::validate(Some("image/png"), vec![137, 80, 78, 71]).unwrap();
        let name = shot.save(&dir).await.unwrap();
        assert!(name.starts_with("payment-") && name.ends_with(".png"));
        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written, [137, 80, 78, 71]);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_stored_path_rejects_traversal() {
        let dir = Path::new("uploads");
        assert!(stored_path(dir, "payment-abc.png").is_some());
        assert!(stored_path(dir, "../secrets.env").is_none());
        assert!(stored_path(dir, "a/b.png").is_none());
        assert!(stored_path(dir, "").is_none());
        assert_eq!(content_type_for("payment-abc.webp"), "image/webp");
        assert_eq!(content_type_for("payment-abc.txt"), "application/octet-stream");
    }
}
