//! Evidence attachments for step executions.

use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::test_evidence;
use crate::error::{AppError, AppResult};

/// Stored evidence record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Evidence {
    pub id: Uuid,
    pub test_step_execution_id: Uuid,
    pub file_name: String,
    /// Opaque handle returned by the evidence store.
    pub file_handle: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<test_evidence::Model> for Evidence {
    fn from(model: test_evidence::Model) -> Self {
        Evidence {
            id: model.id,
            test_step_execution_id: model.test_step_execution_id,
            file_name: model.file_name,
            file_handle: model.file_handle,
            content_type: model.content_type,
            size_bytes: model.size_bytes,
            checksum: model.checksum,
            description: model.description,
            uploaded_by: model.uploaded_by,
            created_at: model.created_at,
        }
    }
}

/// Response for evidence listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidenceListResponse {
    pub evidence: Vec<Evidence>,
}

/// Evidence file submitted with a step update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidenceUpload {
    /// Original file name (no directories).
    pub file_name: String,
    /// MIME type; inferred from the extension when absent.
    #[serde(default)]
    pub content_type: Option<String>,
    /// File contents, base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    #[schema(value_type = String, format = Byte)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EvidenceUpload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject uploads that must not reach the evidence store.
    pub fn validate(&self, max_size: usize) -> AppResult<()> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Evidence file name is required".to_string(),
            ));
        }
        if !is_plain_file_name(name) {
            return Err(AppError::Validation(format!(
                "Evidence file name '{}' must not contain path components",
                name
            )));
        }
        if self.data.is_empty() {
            return Err(AppError::Validation(format!(
                "Evidence file '{}' is empty",
                name
            )));
        }
        if self.data.len() > max_size {
            return Err(AppError::Validation(format!(
                "Evidence file '{}' is {} bytes, maximum is {} bytes",
                name,
                self.data.len(),
                max_size
            )));
        }
        Ok(())
    }
}

/// A single normal path component with no separators of either kind.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// What the evidence store is told about a file it is asked to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceMetadata {
    pub step_execution_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
