//! Batch error types.

use ecgupload_protocol::UnknownDataType;
use ecgupload_transfer::ConnectivityError;

/// The batch directory could not be ensured on the remote side.
#[derive(Debug, thiserror::Error)]
#[error("cannot provision remote directory {path}: {reason}")]
pub struct ProvisionError {
    pub path: String,
    pub reason: String,
}

/// Batch-wide precondition failures. No file was attempted.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),

    #[error("provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    #[error("batch worker failed: {0}")]
    Worker(String),
}

/// Malformed requests, rejected before any remote interaction.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("no files supplied")]
    NoFiles,

    #[error(transparent)]
    UnknownCategory(#[from] UnknownDataType),

    #[error("submitter identity is empty")]
    MissingIdentity,

    #[error("batch size {declared} does not match {actual} files")]
    BatchSizeMismatch { declared: usize, actual: usize },
}
