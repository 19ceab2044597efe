//! Streaming delivery of single files to a remote filesystem.
//!
//! The crate owns the seams the batch orchestrator talks to:
//! [`RemoteFs`] for directory and file operations and [`Connector`] for
//! opening a session. It also provides the pieces of a single file
//! transfer: filename sanitization, the dated remote layout, rewindable
//! sources and the [`StreamWriter`].

mod layout;
mod local;
mod remote;
mod source;
mod streaming;
mod validation;

pub use layout::{RemoteDestination, sidecar_path};
pub use local::{LocalConnector, LocalFs};
pub use remote::{Connector, RemoteFs, RemoteStat, RemoteWrite};
pub use source::{IncomingFile, UploadSource};
pub use streaming::{StreamWriter, WriteReport};
pub use validation::{sanitize_filename, validate_upload_path};

/// Default streaming chunk size: 32 KiB.
///
/// Matches the largest SFTP write most servers accept in one packet.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Errors produced while transferring a single file.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("cannot rewind source stream: {0}")]
    Rewind(std::io::Error),

    #[error("reading source stream failed after {bytes_written} bytes: {source}")]
    Source {
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("remote write to {path} failed after {bytes_written} bytes: {source}")]
    Remote {
        path: String,
        bytes_written: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("file exceeds the size limit of {limit} bytes")]
    TooLarge { limit: u64, bytes_written: u64 },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("metadata encoding failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl TransferError {
    /// Bytes already pushed to the remote side when the error occurred.
    pub fn bytes_written(&self) -> u64 {
        match self {
            TransferError::Source { bytes_written, .. }
            | TransferError::Remote { bytes_written, .. }
            | TransferError::TooLarge { bytes_written, .. } => *bytes_written,
            _ => 0,
        }
    }
}

/// The transport session could not be established.
///
/// Always fatal to the batch that asked for the session; never retried
/// here.
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("cannot resolve {peer}: {reason}")]
    Resolve { peer: String, reason: String },

    #[error("cannot reach {peer}: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("timed out connecting to {peer}")]
    TimedOut { peer: String },

    #[error("SSH handshake with {peer} failed: {reason}")]
    Handshake { peer: String, reason: String },

    #[error("authentication as {user} on {peer} rejected: {reason}")]
    AuthRejected {
        peer: String,
        user: String,
        reason: String,
    },

    #[error("cannot open file transfer channel on {peer}: {reason}")]
    Channel { peer: String, reason: String },
}
