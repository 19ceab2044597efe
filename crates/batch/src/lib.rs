//! Batch upload flow for the ECG upload relay.
//!
//! This crate implements the **business logic** of delivering a batch of
//! files to the remote landing area. It has no knowledge of SSH: the
//! caller supplies a [`Connector`](ecgupload_transfer::Connector) and the
//! orchestrator drives it.
//!
//! # Pipeline
//!
//! 1. **Resolve**: compute `<base>/<category>/<YYYY>/<MM>` once
//! 2. **Connect**: open one session for the whole batch
//! 3. **Provision**: ensure the dated directory exists
//! 4. **Upload**: stream each file and its JSON sidecar
//! 5. **Close**: release the session on every exit path

pub mod error;
pub mod orchestrator;
pub mod provision;
pub mod types;

pub use error::{BatchError, ProvisionError, ValidationError};
pub use orchestrator::BatchUploader;
pub use provision::ensure_directory;
pub use types::{BatchEvent, TransferRequest};
