//! Config document store: read with recovery, pure merge, atomic write.
//!
//! Read policy:
//!   - missing file      → empty document
//!   - unparseable JSON  → empty document, reported as `recovered`
//!   - other I/O failure → `StoreError::Read`
//!
//! Writes land in a temp file beside the target and are renamed over it, so
//! the document on disk is always a complete JSON object.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use volkey_core::config::StoreConfig;
use volkey_core::{ConfigDocument, ConfigValue};

use crate::error::StoreError;

/// Result of loading the document, distinguishing "empty" from
/// "corrupt and discarded".
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub document: ConfigDocument,
    /// The file existed but did not parse; its contents were dropped
    pub recovered: bool,
}

/// Owner of the JSON configuration document at a fixed path.
pub struct ConfigStore {
    path: PathBuf,
    /// Held across read-merge-write when updates are serialized
    update_lock: Option<Mutex<()>>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, serialize_updates: bool) -> Self {
        Self {
            path: path.into(),
            update_lock: serialize_updates.then(|| Mutex::new(())),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.config_path(), config.serialize_updates)
    }

    /// Load the document, never failing: every error degrades to an empty
    /// document.
    pub async fn read(&self) -> ConfigDocument {
        match self.read_outcome().await {
            Ok(outcome) => outcome.document,
            Err(e) => {
                warn!("{e}  (treating config as empty)");
                ConfigDocument::new()
            }
        }
    }

    /// Load the document, surfacing I/O failures other than absence.
    pub async fn read_outcome(&self) -> Result<ReadOutcome, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file absent, starting empty");
                return Ok(ReadOutcome {
                    document: ConfigDocument::new(),
                    recovered: false,
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(ReadOutcome {
                document,
                recovered: false,
            }),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "config file is not a valid document, discarding it: {e}"
                );
                Ok(ReadOutcome {
                    document: ConfigDocument::new(),
                    recovered: true,
                })
            }
        }
    }

    /// Serialize `document` with 4-space indentation and replace the file.
    ///
    /// On failure the previous file is left untouched.
    pub async fn write(&self, document: &ConfigDocument) -> Result<PathBuf, StoreError> {
        let json = to_pretty_json(document)?;
        let target = self.path.clone();

        tokio::task::spawn_blocking(move || replace_file(&target, &json))
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })?
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), keys = document.len(), "config saved");
        Ok(self.path.clone())
    }

    /// Read, merge `fields` on top, and write back.
    pub async fn update<I>(&self, fields: I) -> Result<ConfigDocument, StoreError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let _guard = match &self.update_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let current = self.read_outcome().await?.document;
        let merged = merge(current, fields);
        self.write(&merged).await?;
        Ok(merged)
    }
}

/// Apply `fields` over `document` in order; the last occurrence of a key
/// wins and keys absent from `fields` are kept as they were.
pub fn merge<I>(mut document: ConfigDocument, fields: I) -> ConfigDocument
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in fields {
        document.insert(key, ConfigValue::String(value));
    }
    document
}

fn to_pretty_json(document: &ConfigDocument) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    Ok(buf)
}

fn replace_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
