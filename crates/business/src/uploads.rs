//! Upload store for requirement files
//!
//! Files land under `<root>/uploads/documents/<resident_id>/` with a
//! `%Y%m%d_%H%M%S_` prefix; the stored reference is the path relative to
//! `<root>`, always with `/` separators.

use crate::error::BusinessResult;
use anyhow::Context;
use barangay_core::{text, time};
use std::path::{Path, PathBuf};

/// One file field of a request form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Requirement slot (the form field name)
    pub slot: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Save one uploaded file. Returns `None` when the client filename has
    /// nothing usable left after sanitizing.
    pub async fn save(
        &self,
        resident_id: i64,
        original_name: &str,
        bytes: &[u8],
    ) -> BusinessResult<Option<String>> {
        let Some(name) = text::secure_filename(original_name) else {
            tracing::debug!(resident_id, original_name, "Skipping upload with unusable filename");
            return Ok(None);
        };
        let filename = format!("{}_{}", time::now().format("%Y%m%d_%H%M%S"), name);
        let relative = format!("uploads/documents/{resident_id}/{filename}");

        let dir = self.root.join("uploads").join("documents").join(resident_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        tracing::info!(resident_id, path = %relative, size = bytes.len(), "Requirement file stored");
        Ok(Some(relative))
    }

    /// Remove stored files by their relative reference. Best effort: a file
    /// that cannot be removed is logged and skipped.
    pub async fn discard<I, S>(&self, relatives: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for relative in relatives {
            let path = self.root.join(relative.as_ref());
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %relative.as_ref(), "Requirement file discarded"),
                Err(err) => tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to discard requirement file"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_under_resident_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let relative = store
            .save(7, "../My Valid ID.png", b"png-bytes")
            .await
            .unwrap()
            .unwrap();
        assert!(relative.starts_with("uploads/documents/7/"));
        assert!(relative.ends_with("_My_Valid_ID.png"));

        let stored = tokio::fs::read(dir.path().join(&relative)).await.unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_unusable_filename_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        assert_eq!(store.save(7, "..", b"x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_discard_removes_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let kept = store.save(7, "kept.png", b"a").await.unwrap().unwrap();
        let dropped = store.save(7, "dropped.png", b"b").await.unwrap().unwrap();
        store.discard([&dropped, &"uploads/documents/7/missing.png".to_string()]).await;

        assert!(dir.path().join(&kept).exists());
        assert!(!dir.path().join(&dropped).exists());
    }
}
