//! Batch orchestrator.
//!
//! Opens one session per batch, provisions the dated directory and streams
//! every file in submission order. File-level failures become outcomes;
//! only session and provisioning failures abort the batch.

use std::collections::HashSet;
use std::sync::Arc;

use ecgupload_protocol::{DataType, MetadataContext, TransferOutcome};
use ecgupload_transfer::{
    Connector, IncomingFile, RemoteDestination, RemoteFs, StreamWriter, sanitize_filename,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::BatchError;
use crate::provision::ensure_directory;
use crate::types::{BatchEvent, TransferRequest};

/// Uploads batches through a [`Connector`].
///
/// Holds configuration only. Every call to [`upload_batch`](Self::upload_batch)
/// opens and closes its own session, so one uploader can serve any number
/// of concurrent batches.
pub struct BatchUploader<C: Connector> {
    connector: C,
    base_path: String,
    writer: StreamWriter,
    events_tx: Option<mpsc::Sender<BatchEvent>>,
}

impl<C: Connector> BatchUploader<C> {
    /// Creates an uploader writing below `base_path` on the remote side.
    pub fn new(connector: C, base_path: impl Into<String>) -> Self {
        Self {
            connector,
            base_path: base_path.into(),
            writer: StreamWriter::default(),
            events_tx: None,
        }
    }

    /// Replaces the default stream writer (chunk size, size limit).
    pub fn with_writer(mut self, writer: StreamWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Sends progress events to `tx`. Sends never block; events are dropped
    /// when the channel is full.
    pub fn with_events(mut self, tx: mpsc::Sender<BatchEvent>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Destination directory for a batch of `category` submitted under
    /// `context`.
    pub fn destination_for(
        &self,
        category: DataType,
        context: &MetadataContext,
    ) -> RemoteDestination {
        RemoteDestination::resolve(
            &self.base_path,
            category,
            context.submitted_at.date_naive(),
        )
    }

    /// Uploads every file of `request` and returns one outcome per file, in
    /// submission order.
    ///
    /// Blocks for the whole transfer. An empty request returns immediately
    /// without connecting.
    pub fn upload_batch(
        &self,
        request: TransferRequest,
    ) -> Result<Vec<TransferOutcome>, BatchError> {
        let TransferRequest {
            files,
            category,
            context,
        } = request;

        if files.is_empty() {
            return Ok(Vec::new());
        }

        let batch_id = context.batch_id;
        let destination = self.destination_for(category, &context);
        info!(
            batch = %batch_id,
            category = %category,
            files = files.len(),
            dir = %destination.dir(),
            peer = %self.connector.peer(),
            "starting upload batch"
        );

        let session = self.connector.open().inspect_err(|e| {
            error!(batch = %batch_id, error = %e, "cannot open session");
        })?;

        if let Err(e) = ensure_directory(&session, destination.dir()) {
            error!(batch = %batch_id, error = %e, "cannot provision batch directory");
            return Err(e.into());
        }

        // Names already landed by this batch; a later file must not replace them.
        let mut landed: HashSet<String> = HashSet::with_capacity(files.len());
        let mut outcomes = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            let outcome = self.upload_one(
                &session,
                &destination,
                category,
                &context,
                index,
                file,
                &mut landed,
            );
            outcomes.push(outcome);
        }

        let uploaded = outcomes.iter().filter(|o| o.is_uploaded()).count();
        let failed = outcomes.len() - uploaded;
        self.emit(BatchEvent::BatchFinished {
            batch_id,
            uploaded,
            failed,
        });
        info!(batch = %batch_id, uploaded, failed, "upload batch finished");

        // Session drops here and closes the connection.
        Ok(outcomes)
    }

    /// Runs [`upload_batch`](Self::upload_batch) on a dedicated blocking
    /// worker.
    pub async fn spawn_batch(
        self: Arc<Self>,
        request: TransferRequest,
    ) -> Result<Vec<TransferOutcome>, BatchError>
    where
        C: 'static,
    {
        tokio::task::spawn_blocking(move || self.upload_batch(request))
            .await
            .map_err(|e| BatchError::Worker(e.to_string()))?
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_one<F: RemoteFs + ?Sized>(
        &self,
        remote: &F,
        destination: &RemoteDestination,
        category: DataType,
        context: &MetadataContext,
        index: usize,
        mut file: IncomingFile,
        landed: &mut HashSet<String>,
    ) -> TransferOutcome {
        let batch_id = context.batch_id;
        self.emit(BatchEvent::FileStarted {
            batch_id,
            index,
            filename: file.filename.clone(),
        });

        let safe_name = sanitize_filename(&file.filename);

        if landed.contains(&safe_name) {
            let error = format!(
                "duplicate filename {safe_name} in batch would overwrite an earlier file"
            );
            return self.fail(batch_id, index, &safe_name, "", 0, error);
        }

        if let Err(e) = self.writer.check_declared_size(file.declared_size) {
            return self.fail(batch_id, index, &safe_name, "", 0, e.to_string());
        }

        let remote_path = destination.file_path(&safe_name);

        let report = match self
            .writer
            .write_file(remote, file.source_mut(), &remote_path)
        {
            Ok(report) => report,
            Err(e) => {
                let bytes = e.bytes_written();
                return self.fail(
                    batch_id,
                    index,
                    &safe_name,
                    &remote_path,
                    bytes,
                    e.to_string(),
                );
            }
        };

        let sidecar = context.sidecar(category, &safe_name, report.bytes_written);
        let sidecar_written = match self.writer.write_sidecar(remote, &remote_path, &sidecar) {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    batch = %batch_id,
                    path = %remote_path,
                    error = %e,
                    "sidecar not written, file kept"
                );
                false
            }
        };

        landed.insert(safe_name.clone());
        info!(
            batch = %batch_id,
            path = %remote_path,
            bytes = report.bytes_written,
            sha256 = %report.sha256,
            "file uploaded"
        );
        self.emit(BatchEvent::FileUploaded {
            batch_id,
            index,
            remote_path: remote_path.clone(),
            bytes: report.bytes_written,
        });

        TransferOutcome::Uploaded {
            filename: safe_name,
            remote_path,
            bytes_written: report.bytes_written,
            sha256: report.sha256,
            sidecar_written,
        }
    }

    fn fail(
        &self,
        batch_id: uuid::Uuid,
        index: usize,
        filename: &str,
        remote_path: &str,
        bytes_written: u64,
        error: String,
    ) -> TransferOutcome {
        let outcome = TransferOutcome::failed(filename, remote_path, bytes_written, error);
        let message = outcome.error().unwrap_or_default().to_string();
        warn!(batch = %batch_id, file = %filename, error = %message, "file failed");
        self.emit(BatchEvent::FileFailed {
            batch_id,
            index,
            error: message,
        });
        outcome
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.try_send(event);
        }
    }
}
