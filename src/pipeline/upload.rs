use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Lowercased extension of `filename` if it is one we accept.
///
/// Only the claimed name is checked: the last dot-delimited segment,
/// case-insensitive. An empty name or a name without a dot is rejected.
pub fn allowed_extension(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// An uploaded image written to a uniquely named file for the detector.
///
/// The file is removed when the guard is dropped, on every exit path of the
/// request. A failed removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub async fn write(dir: &Path, ext: &str, bytes: &[u8]) -> Result<Self> {
        let path = dir.join(format!("temp_{}.{}", uuid::Uuid::new_v4().simple(), ext));
        // Guard exists before the write so a partial file is still cleaned up.
        let upload = Self { path };
        tokio::fs::write(&upload.path, bytes)
            .await
            .with_context(|| format!("Failed to write upload to {:?}", upload.path))?;
        debug!("Saved upload to {:?} ({} bytes)", upload.path, bytes.len());
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temp upload {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete temp file {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        for name in ["a.png", "a.JPG", "face.Jpeg", "x.gif", "scan.BMP", "my.photo.jpg", ".png"] {
            assert!(allowed_extension(name).is_some(), "{name} should be accepted");
        }
        assert_eq!(allowed_extension("Selfie.JPEG").as_deref(), Some("jpeg"));
    }

    #[test]
    fn test_rejected_names() {
        for name in ["", "photo", "photo.", "virus.exe", "notes.txt", "image.webp", "jpg", "a.jpg.exe", "a.tiff"] {
            assert!(allowed_extension(name).is_none(), "{name:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_temp_upload_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let upload = TempUpload::write(dir.path(), "jpg", b"bytes").await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("temp_"));
        assert_eq!(path.extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_temp_upload_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let a = TempUpload::write(dir.path(), "png", b"a").await.unwrap();
        let b = TempUpload::write(dir.path(), "png", b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_drop_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let upload = TempUpload::write(dir.path(), "gif", b"x").await.unwrap();
        std::fs::remove_file(upload.path()).unwrap();
        drop(upload);
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(TempUpload::write(&missing, "jpg", b"x").await.is_err());
    }
}
