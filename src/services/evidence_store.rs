//! Evidence store abstraction and the local directory backend.
//!
//! The execution core only keeps the handle a store returns; how and where the
//! bytes live is up to the backend.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::EvidenceMetadata;

/// Keeps evidence files and hands back opaque handles.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persist the bytes and return a handle to them.
    async fn store(&self, data: Vec<u8>, metadata: &EvidenceMetadata) -> AppResult<String>;

    /// Release a previously stored file. Unknown handles are not an error.
    async fn remove(&self, handle: &str) -> AppResult<()>;
}

/// Build the storage key for an evidence file.
///
/// Format: evidence/{step_execution_id}/{unique_id}_{file_name}
pub fn evidence_key(step_execution_id: Uuid, file_name: &str) -> String {
    format!(
        "evidence/{}/{}_{}",
        step_execution_id,
        Uuid::now_v7().simple(),
        file_name
    )
}

/// Hex SHA-256 of evidence bytes.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Get the content type for a file based on its extension.
pub fn content_type_for_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "har" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Evidence kept as files under a local directory.
#[derive(Debug, Clone)]
pub struct LocalEvidenceStore {
    root: PathBuf,
}

impl LocalEvidenceStore {
    /// Create the store, creating the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create evidence directory {}: {}",
                root.display(),
                e
            ))
        })?;
        info!("Local evidence store initialized at {}", root.display());
        Ok(Self { root })
    }

    /// Resolve a handle to a path inside the root, refusing anything that
    /// would escape it.
    fn path_for(&self, handle: &str) -> AppResult<PathBuf> {
        let relative = Path::new(handle);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || handle.is_empty() {
            return Err(AppError::Storage(format!(
                "Invalid evidence handle '{}'",
                handle
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl EvidenceStore for LocalEvidenceStore {
    async fn store(&self, data: Vec<u8>, metadata: &EvidenceMetadata) -> AppResult<String> {
        let handle = evidence_key(metadata.step_execution_id, &metadata.file_name);
        let path = self.path_for(&handle)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create evidence directory: {}", e))
            })?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write evidence file: {}", e)))?;

        debug!(handle = %handle, size_bytes = metadata.size_bytes, "Stored evidence file");
        Ok(handle)
    }

    async fn remove(&self, handle: &str) -> AppResult<()> {
        let path = self.path_for(handle)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove evidence file: {}",
                e
            ))),
        }
    }
}
