//! Uploaded file persistence.
//!
//! Client file names are reduced to a single safe path component before
//! use. Two uploads that sanitize to the same name overwrite each other.

use std::path::PathBuf;
use tracing::debug;

use crate::error::StoreError;

pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `content` under the sanitized form of `file_name`.
    pub async fn save(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, StoreError> {
        let safe_name = sanitize_filename(file_name)
            .ok_or_else(|| StoreError::InvalidFileName(file_name.to_string()))?;
        let path = self.dir.join(&safe_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Write {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = content.len(), "upload saved");
        Ok(path)
    }
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Path separators become spaces, runs of whitespace become `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped, and leading/trailing `.` and `_` are
/// trimmed. Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name_unchanged() {
        assert_eq!(sanitize_filename("disk.img").as_deref(), Some("disk.img"));
        assert_eq!(sanitize_filename("vol-01_a.bin").as_deref(), Some("vol-01_a.bin"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\disk.img").as_deref(),
            Some("C_Users_me_disk.img")
        );
        assert_eq!(sanitize_filename("/abs/path.key").as_deref(), Some("abs_path.key"));
    }

    #[test]
    fn test_sanitize_whitespace_and_symbols() {
        assert_eq!(
            sanitize_filename("my  backup (1).img").as_deref(),
            Some("my_backup_1.img")
        );
        assert_eq!(sanitize_filename("clé.bin").as_deref(), Some("cl.bin"));
    }

    #[test]
    fn test_sanitize_nothing_left() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("///"), None);
        assert_eq!(sanitize_filename("ééé"), None);
    }

    #[tokio::test]
    async fn test_save_writes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let path = store.save("../disk.img", b"payload").await.unwrap();

        assert_eq!(path, dir.path().join("uploads").join("disk.img"));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_save_same_name_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        store.save("disk.img", b"first").await.unwrap();
        let path = store.save("disk.img", b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_rejects_unusable_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        assert!(matches!(
            store.save("..", b"x").await,
            Err(StoreError::InvalidFileName(_))
        ));
    }
}
