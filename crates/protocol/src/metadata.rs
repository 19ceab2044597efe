//! Provenance attached to every uploaded file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DataType;

/// Batch-wide context supplied by the identity layer.
///
/// The relay trusts `submitter_identity` and `submitter_role` verbatim;
/// they are only used to tag the sidecar documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataContext {
    pub submitter_identity: String,
    pub submitter_role: String,
    pub batch_id: Uuid,
    pub batch_size: usize,
    pub submitted_at: DateTime<Utc>,
}

impl MetadataContext {
    /// Creates a context for a batch submitted now, with a fresh batch id.
    pub fn new(
        submitter_identity: impl Into<String>,
        submitter_role: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            submitter_identity: submitter_identity.into(),
            submitter_role: submitter_role.into(),
            batch_id: Uuid::new_v4(),
            batch_size,
            submitted_at: Utc::now(),
        }
    }

    /// Overrides the submission timestamp.
    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Builds the sidecar document for one file of this batch.
    pub fn sidecar(&self, data_type: DataType, filename: &str, size_bytes: u64) -> SidecarMetadata {
        SidecarMetadata {
            uploaded_by: self.submitter_identity.clone(),
            user_role: self.submitter_role.clone(),
            data_type,
            batch_size: self.batch_size,
            batch_id: Some(self.batch_id),
            timestamp_utc: self.submitted_at,
            filename: filename.to_string(),
            size_bytes,
        }
    }
}

/// JSON document written as `<file>.json` next to each remote file.
///
/// Field names are consumed by downstream tooling in the landing area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    pub uploaded_by: String,
    pub user_role: String,
    pub data_type: DataType,
    pub batch_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    pub timestamp_utc: DateTime<Utc>,
    pub filename: String,
    pub size_bytes: u64,
}

impl SidecarMetadata {
    /// Renders the document with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}
