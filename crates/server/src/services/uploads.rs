//! Image upload storage.
//!
//! Uploaded business logos and product images land on local disk under the
//! configured upload root and are served back via `ServeDir` at `/uploads`.
//! Files are written before the owning row is committed; if the database
//! write then fails, the route layer removes the orphaned file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Extensions accepted for image uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix the files are served under.
const PUBLIC_PREFIX: &str = "/uploads";

/// What kind of entity an upload belongs to. Determines the subdirectory.
#[derive(Debug, Clone, Copy)]
pub enum UploadKind {
    BusinessLogo,
    ProductImage,
}

impl UploadKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::BusinessLogo => "businesses",
            Self::ProductImage => "products",
        }
    }
}

/// Errors from the upload store.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The uploaded file is not an accepted image type.
    #[error("unsupported image type; expected one of: jpg, jpeg, png, gif, webp")]
    InvalidImageType,

    /// Filesystem error while writing or deleting.
    #[error("upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local-disk store for uploaded images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at the configured upload directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory `ServeDir` should serve at [`PUBLIC_PREFIX`].
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded image and return its public URL path
    /// (e.g. `/uploads/products/3f2a....png`).
    ///
    /// The stored filename is a fresh UUID plus the validated extension of
    /// the client's filename; the client's name itself never touches disk.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidImageType` for non-image extensions and
    /// `UploadError::Io` if the write fails.
    pub async fn save(
        &self,
        kind: UploadKind,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<String, UploadError> {
        let ext = validate_extension(original_name)?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());

        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), data).await?;

        Ok(format!("{PUBLIC_PREFIX}/{}/{file_name}", kind.dir()))
    }

    /// Best-effort removal of a previously stored file by its public URL.
    ///
    /// Unknown or already-deleted files are ignored; other filesystem errors
    /// are logged and swallowed, since a stale file on disk is harmless.
    pub async fn remove(&self, public_url: &str) {
        let Some(relative) = public_url.strip_prefix(&format!("{PUBLIC_PREFIX}/")) else {
            return;
        };
        // The URL came from our own database, but refuse traversal anyway.
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return;
        }

        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove upload");
        }
    }
}

/// Pull a lowercase extension off the client filename and check it against
/// the image allowlist.
fn validate_extension(original_name: Option<&str>) -> Result<String, UploadError> {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or(UploadError::InvalidImageType)?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(UploadError::InvalidImageType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert_eq!(validate_extension(Some("logo.PNG")).unwrap(), "png");
        assert_eq!(validate_extension(Some("a.b.jpeg")).unwrap(), "jpeg");
    }

    #[test]
    fn rejects_non_images_and_missing_names() {
        assert!(validate_extension(Some("script.sh")).is_err());
        assert!(validate_extension(Some("noextension")).is_err());
        assert!(validate_extension(None).is_err());
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let dir = std::env::temp_dir().join(format!("shopmate-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&dir);

        let url = store
            .save(UploadKind::ProductImage, Some("photo.png"), b"png-bytes")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/products/"));
        assert!(url.ends_with(".png"));

        let on_disk = dir.join(url.strip_prefix("/uploads/").unwrap());
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        store.remove(&url).await;
        assert!(!on_disk.exists());

        // Removing again is a no-op, not an error.
        store.remove(&url).await;

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn remove_refuses_traversal() {
        let dir = std::env::temp_dir().join(format!("shopmate-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&dir);

        // Nothing to assert beyond "does not panic and does not escape root";
        // the guard returns before touching the filesystem.
        store.remove("/uploads/../../etc/passwd").await;
        store.remove("not-even-an-upload-url").await;
    }
}
