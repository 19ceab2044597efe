//! Data types for the batch flow.

use ecgupload_protocol::{DataType, MetadataContext};
use ecgupload_transfer::IncomingFile;
use uuid::Uuid;

use crate::error::ValidationError;

/// Files submitted together under one category and metadata context.
///
/// Built by the boundary layer and consumed by
/// [`BatchUploader::upload_batch`](crate::BatchUploader::upload_batch).
#[derive(Debug)]
pub struct TransferRequest {
    pub(crate) files: Vec<IncomingFile>,
    pub(crate) category: DataType,
    pub(crate) context: MetadataContext,
}

impl TransferRequest {
    pub fn new(category: DataType, context: MetadataContext, files: Vec<IncomingFile>) -> Self {
        Self {
            files,
            category,
            context,
        }
    }

    pub fn category(&self) -> DataType {
        self.category
    }

    pub fn context(&self) -> &MetadataContext {
        &self.context
    }

    pub fn files(&self) -> &[IncomingFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Boundary checks. The orchestrator itself tolerates an empty request;
    /// callers that want a client error run this first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::NoFiles);
        }
        if self.context.submitter_identity.trim().is_empty() {
            return Err(ValidationError::MissingIdentity);
        }
        if self.context.batch_size != self.files.len() {
            return Err(ValidationError::BatchSizeMismatch {
                declared: self.context.batch_size,
                actual: self.files.len(),
            });
        }
        Ok(())
    }
}

/// Progress event emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    FileStarted {
        batch_id: Uuid,
        index: usize,
        filename: String,
    },
    FileUploaded {
        batch_id: Uuid,
        index: usize,
        remote_path: String,
        bytes: u64,
    },
    FileFailed {
        batch_id: Uuid,
        index: usize,
        error: String,
    },
    BatchFinished {
        batch_id: Uuid,
        uploaded: usize,
        failed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(n: usize) -> Vec<IncomingFile> {
        (0..n)
            .map(|i| IncomingFile::from_bytes(format!("f{i}.csv"), vec![b'x'; 4]))
            .collect()
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        let request = TransferRequest::new(
            DataType::Ring,
            MetadataContext::new("alice", "user", 2),
            files(2),
        );
        assert!(request.validate().is_ok());
        assert_eq!(request.len(), 2);
        assert_eq!(request.category(), DataType::Ring);
    }

    #[test]
    fn validate_rejects_empty_request() {
        let request = TransferRequest::new(
            DataType::Ring,
            MetadataContext::new("alice", "user", 0),
            Vec::new(),
        );
        assert!(request.is_empty());
        assert!(matches!(request.validate(), Err(ValidationError::NoFiles)));
    }

    #[test]
    fn validate_rejects_blank_identity() {
        let request = TransferRequest::new(
            DataType::Watches,
            MetadataContext::new(" ", "user", 1),
            files(1),
        );
        assert!(matches!(
            request.validate(),
            Err(ValidationError::MissingIdentity)
        ));
    }

    #[test]
    fn validate_rejects_batch_size_mismatch() {
        let request = TransferRequest::new(
            DataType::Watches,
            MetadataContext::new("alice", "user", 5),
            files(2),
        );
        assert!(matches!(
            request.validate(),
            Err(ValidationError::BatchSizeMismatch {
                declared: 5,
                actual: 2
            })
        ));
    }
}
