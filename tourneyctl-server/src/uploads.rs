//! Image validation and on-disk storage
//!
//! Only JPG, PNG and GIF are accepted. A file is checked twice: its
//! declared type (or the type guessed from its extension) must be on the
//! allow-list, and its leading bytes must carry a matching signature.
//! Stored files get a random name and keep the original extension.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::models::{Upload, ValidationError};

/// Longest extension kept from the original filename
const MAX_EXTENSION_LEN: usize = 8;

/// Recognized image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Parse a MIME type, ignoring parameters and case.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Identify the format from its magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// Check an upload against the allow-list and a size limit.
///
/// `field` names the form field in error messages.
pub fn validate_image(
    field: &'static str,
    upload: &Upload,
    max_bytes: u64,
) -> Result<ImageKind, ValidationError> {
    if upload.content.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    let declared = declared_type(upload);
    if let Some(mime) = &declared {
        if ImageKind::from_mime(mime).is_none() {
            return Err(ValidationError::UnsupportedImageType {
                field,
                found: mime.clone(),
            });
        }
    }

    let kind = ImageKind::sniff(&upload.content).ok_or_else(|| {
        ValidationError::UnsupportedImageType {
            field,
            found: declared.unwrap_or_else(|| "unknown".to_string()),
        }
    })?;

    if upload.content.len() as u64 > max_bytes {
        return Err(ValidationError::ImageTooLarge { field, max_bytes });
    }

    Ok(kind)
}

/// The part's declared type, falling back to a guess from the filename
/// when the client sent nothing useful.
fn declared_type(upload: &Upload) -> Option<String> {
    match upload.content_type.as_deref().map(str::trim) {
        Some(mime) if !mime.is_empty() && !mime.eq_ignore_ascii_case("application/octet-stream") => {
            Some(mime.to_string())
        }
        _ => mime_guess::from_path(&upload.filename)
            .first_raw()
            .map(str::to_string),
    }
}

/// Image storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create uploads directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("uploads directory {path:?} is not writable")]
    ReadOnly { path: PathBuf },

    #[error("failed to save file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Uploads directory plus the public prefix images are served under
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an already validated upload; returns the stored file name.
    pub async fn save(&self, upload: &Upload, kind: ImageKind) -> Result<String, StorageError> {
        self.ensure_dir().await?;

        let name = format!(
            "{}.{}",
            Uuid::new_v4().simple(),
            stored_extension(&upload.filename, kind)
        );
        let path = self.dir.join(&name);

        tokio::fs::write(&path, &upload.content)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(file = %name, bytes = upload.content.len(), "stored image");
        Ok(name)
    }

    /// Delete a stored file, best effort.
    ///
    /// Directory components in `name` are ignored; a missing file is fine.
    pub async fn remove(&self, name: &str) {
        let Some(file_name) = Path::new(name).file_name() else {
            return;
        };
        let path = self.dir.join(file_name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(file = %path.display(), "removed image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "failed to remove image"),
        }
    }

    /// Public URL for a stored file name.
    pub fn public_url(&self, name: &str) -> String {
        if self.public_base_url.ends_with('/') {
            format!("{}{}", self.public_base_url, name)
        } else {
            format!("{}/{}", self.public_base_url, name)
        }
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let metadata = tokio::fs::metadata(&self.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        if metadata.permissions().readonly() {
            return Err(StorageError::ReadOnly {
                path: self.dir.clone(),
            });
        }

        Ok(())
    }
}

/// Lowercased original extension when it maps to the sniffed format,
/// otherwise the format's own extension.
///
/// Uploads are served with a type guessed from the extension.
fn stored_extension(filename: &str, kind: ImageKind) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .iter_raw()
                .any(|mime| mime == kind.mime())
        })
        .unwrap_or_else(|| kind.extension().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

    fn upload(filename: &str, content_type: Option<&str>, content: &'static [u8]) -> Upload {
        Upload {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            content: Bytes::from_static(content),
        }
    }

    #[test]
    fn sniffs_known_signatures() {
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(GIF), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"hello"), None);
    }

    #[test]
    fn mime_parsing_ignores_case_and_params() {
        assert_eq!(ImageKind::from_mime("IMAGE/PNG"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_mime("image/gif; charset=binary"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::from_mime("image/webp"), None);
        for kind in [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif] {
            assert_eq!(ImageKind::from_mime(kind.mime()), Some(kind));
        }
    }

    #[test]
    fn accepts_declared_png() {
        let kind = validate_image("image", &upload("a.png", Some("image/png"), PNG), 1024).unwrap();
        assert_eq!(kind, ImageKind::Png);
    }

    #[test]
    fn rejects_declared_text_plain() {
        let err = validate_image("image", &upload("a.png", Some("text/plain"), PNG), 1024).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedImageType {
                field: "image",
                found: "text/plain".to_string()
            }
        );
    }

    #[test]
    fn rejects_text_content_behind_image_type() {
        let err = validate_image("image", &upload("a.png", Some("image/png"), b"just text"), 1024)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedImageType { .. }));
    }

    #[test]
    fn guesses_type_from_extension_when_undeclared() {
        let err = validate_image(
            "image",
            &upload("notes.txt", Some("application/octet-stream"), PNG),
            1024,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnsupportedImageType { ref found, .. } if found == "text/plain"
        ));

        let kind = validate_image("image", &upload("photo.gif", None, GIF), 1024).unwrap();
        assert_eq!(kind, ImageKind::Gif);
    }

    #[test]
    fn enforces_size_limit() {
        let err = validate_image("player_image", &upload("a.png", Some("image/png"), PNG), 4)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ImageTooLarge {
                field: "player_image",
                max_bytes: 4
            }
        );
    }

    #[test]
    fn rejects_empty_upload() {
        let err = validate_image("image", &upload("a.png", Some("image/png"), b""), 1024).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "image" });
    }

    #[test]
    fn extension_handling() {
        assert_eq!(stored_extension("Photo.PNG", ImageKind::Png), "png");
        assert_eq!(stored_extension("photo", ImageKind::Gif), "gif");
        assert_eq!(stored_extension("photo.p n g", ImageKind::Png), "png");
        assert_eq!(stored_extension("photo.jpeg", ImageKind::Jpeg), "jpeg");
        assert_eq!(stored_extension("photo.JPG", ImageKind::Jpeg), "jpg");
    }

    #[test]
    fn extension_must_match_detected_format() {
        assert_eq!(stored_extension("x.html", ImageKind::Png), "png");
        assert_eq!(stored_extension("x.svg", ImageKind::Gif), "gif");
        assert_eq!(stored_extension("x.gif", ImageKind::Png), "png");
        assert_eq!(stored_extension("x.exe", ImageKind::Jpeg), "jpg");
    }

    #[test]
    fn public_url_joins_with_single_slash() {
        let store = ImageStore::new("uploads", "/api/uploads/");
        assert_eq!(store.public_url("a.png"), "/api/uploads/a.png");

        let store = ImageStore::new("uploads", "https://cdn.example.com/img");
        assert_eq!(store.public_url("a.png"), "https://cdn.example.com/img/a.png");
    }

    #[tokio::test]
    async fn save_creates_directory_and_random_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path().join("nested/uploads"), "/api/uploads/");
        let file = upload("Team Logo.PNG", Some("image/png"), PNG);

        let first = store.save(&file, ImageKind::Png).await.unwrap();
        let second = store.save(&file, ImageKind::Png).await.unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with(".png"));
        assert_eq!(first.len(), 32 + ".png".len());
        let written = std::fs::read(store.dir().join(&first)).unwrap();
        assert_eq!(written, PNG);
    }

    #[tokio::test]
    async fn remove_is_best_effort() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path(), "/api/uploads/");
        let name = store
            .save(&upload("a.gif", None, GIF), ImageKind::Gif)
            .await
            .unwrap();

        // legacy rows may carry a directory prefix
        store.remove(&format!("uploads/{}", name)).await;
        assert!(!tmp.path().join(&name).exists());

        store.remove(&name).await;
        store.remove("").await;
    }

    #[tokio::test]
    async fn save_fails_when_directory_cannot_be_created() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let store = ImageStore::new(blocker.join("uploads"), "/api/uploads/");
        let err = store
            .save(&upload("a.png", None, PNG), ImageKind::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::CreateDir { .. }));
    }
}
