//! Data types exchanged between the upload relay and its collaborators.
//!
//! Everything here is plain serde data: the category tags accepted by the
//! relay, the metadata context attached by the identity layer, the JSON
//! sidecar written next to every remote file, and the per-file outcome and
//! audit record handed to the persistence layer.

pub mod metadata;
pub mod outcome;
pub mod types;

pub use metadata::{MetadataContext, SidecarMetadata};
pub use outcome::{AuditRecord, TransferOutcome};
pub use types::{DataType, UnknownDataType, UploadStatus};
