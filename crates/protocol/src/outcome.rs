//! Per-file transfer results and their audit-log projection.

use serde::{Deserialize, Serialize};

use crate::types::{DataType, UploadStatus};

/// Final result of one file in a batch.
///
/// Serialized with a `status` tag so the JSON reads
/// `{"status": "uploaded", "filename": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransferOutcome {
    Uploaded {
        filename: String,
        remote_path: String,
        bytes_written: u64,
        sha256: String,
        sidecar_written: bool,
    },
    Failed {
        filename: String,
        /// Empty when the file was rejected before any remote interaction.
        #[serde(default)]
        remote_path: String,
        #[serde(default)]
        bytes_written: u64,
        error: String,
    },
}

impl TransferOutcome {
    /// Builds a failed outcome. An empty `error` is replaced by a generic one.
    pub fn failed(
        filename: impl Into<String>,
        remote_path: impl Into<String>,
        bytes_written: u64,
        error: impl Into<String>,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown transfer error".into();
        }
        TransferOutcome::Failed {
            filename: filename.into(),
            remote_path: remote_path.into(),
            bytes_written,
            error,
        }
    }

    pub fn status(&self) -> UploadStatus {
        match self {
            TransferOutcome::Uploaded { .. } => UploadStatus::Uploaded,
            TransferOutcome::Failed { .. } => UploadStatus::Failed,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            TransferOutcome::Uploaded { filename, .. } | TransferOutcome::Failed { filename, .. } => {
                filename
            }
        }
    }

    pub fn remote_path(&self) -> &str {
        match self {
            TransferOutcome::Uploaded { remote_path, .. }
            | TransferOutcome::Failed { remote_path, .. } => remote_path,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        match self {
            TransferOutcome::Uploaded { bytes_written, .. }
            | TransferOutcome::Failed { bytes_written, .. } => *bytes_written,
        }
    }

    /// Error description, present only for failed outcomes.
    pub fn error(&self) -> Option<&str> {
        match self {
            TransferOutcome::Uploaded { .. } => None,
            TransferOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self, TransferOutcome::Uploaded { .. })
    }

    /// Projects the outcome into a row for the external audit log.
    ///
    /// Failed rows always carry an empty `remote_path`: the file never
    /// landed, whatever path was attempted.
    pub fn to_audit_record(&self, category: DataType) -> AuditRecord {
        match self {
            TransferOutcome::Uploaded {
                filename,
                remote_path,
                ..
            } => AuditRecord {
                filename: filename.clone(),
                category,
                remote_path: remote_path.clone(),
                status: UploadStatus::Uploaded,
                error_detail: None,
            },
            TransferOutcome::Failed {
                filename, error, ..
            } => AuditRecord {
                filename: filename.clone(),
                category,
                remote_path: String::new(),
                status: UploadStatus::Failed,
                error_detail: Some(error.clone()),
            },
        }
    }
}

/// One row of the transfer history, inserted one-to-one per submitted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub filename: String,
    pub category: DataType,
    pub remote_path: String,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}
