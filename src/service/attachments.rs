//! Receipt Attachments
//!
//! Binary receipt files live outside the reconciliation core. Item sets only
//! hold the attachment id returned by `store`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{DomainError, DomainResult, FileIdentifier};

/// Metadata kept next to a stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn store(&self, bytes: &[u8], filename: &str) -> DomainResult<StoredFile>;

    async fn load(&self, id: &str) -> DomainResult<(StoredFile, Vec<u8>)>;

    async fn delete(&self, id: &str) -> DomainResult<()>;
}

/// Content-addressed store in a local directory: `<id>` holds the bytes,
/// `<id>.json` the metadata.
pub struct FsAttachmentStore {
    dir: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn paths(&self, id: &str) -> DomainResult<(PathBuf, PathBuf)> {
        if !FileIdentifier::is_valid_id(id) {
            return Err(DomainError::InvalidInput(format!("Invalid attachment id '{}'", id)));
        }
        Ok((self.dir.join(id), self.dir.join(format!("{}.json", id))))
    }
}

fn io_error(e: std::io::Error) -> DomainError {
    DomainError::Internal(format!("Attachment I/O failed: {}", e))
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn store(&self, bytes: &[u8], filename: &str) -> DomainResult<StoredFile> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput("Attachment is empty".into()));
        }

        let id = FileIdentifier::compute_bytes_hash(bytes);
        let (data_path, meta_path) = self.paths(&id)?;
        let meta = StoredFile {
            id,
            filename: filename.to_string(),
            content_type: mime_guess::from_path(filename)
                .first_or_octet_stream()
                .to_string(),
            size: bytes.len() as u64,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        tokio::fs::write(&data_path, bytes).await.map_err(io_error)?;
        tokio::fs::write(&meta_path, serde_json::to_vec(&meta)?)
            .await
            .map_err(io_error)?;

        log::debug!("Stored attachment {} ({} bytes)", meta.id, meta.size);
        Ok(meta)
    }

    async fn load(&self, id: &str) -> DomainResult<(StoredFile, Vec<u8>)> {
        let (data_path, meta_path) = self.paths(id)?;

        let meta_bytes = match tokio::fs::read(&meta_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DomainError::NotFound(format!("Attachment {} not found", id)));
            }
            Err(e) => return Err(io_error(e)),
        };
        let meta: StoredFile = serde_json::from_slice(&meta_bytes)?;
        let bytes = tokio::fs::read(&data_path).await.map_err(io_error)?;
        Ok((meta, bytes))
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let (data_path, meta_path) = self.paths(id)?;

        for path in [data_path, meta_path] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e)),
            }
        }
        Ok(())
    }
}
