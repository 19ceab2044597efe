//! Wires the CLI to the batch uploader.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ecgupload_batch::{BatchEvent, BatchUploader, TransferRequest, ValidationError};
use ecgupload_protocol::{AuditRecord, DataType, MetadataContext};
use ecgupload_sftp::SftpConnector;
use ecgupload_transfer::{Connector, IncomingFile, LocalConnector, StreamWriter};
use tokio::sync::mpsc;

use crate::Cli;
use crate::config::Config;

/// Runs one batch and returns its audit records in submission order.
pub async fn run(cli: &Cli, config: Config) -> anyhow::Result<Vec<AuditRecord>> {
    let category: DataType = cli.category.parse().map_err(ValidationError::from)?;
    let request = build_request(category, &cli.user, &cli.role, &cli.files)?;
    request.validate()?;

    let writer = config.upload.writer();
    let outcomes = match &cli.local_root {
        Some(root) => {
            let base = if config.sftp.remote_path.trim().is_empty() {
                "/"
            } else {
                config.sftp.remote_path.as_str()
            };
            upload(LocalConnector::new(root), base, writer, request).await?
        }
        None => {
            let base = config.sftp.remote_path.clone();
            upload(SftpConnector::new(config.sftp), &base, writer, request).await?
        }
    };

    let records: Vec<AuditRecord> = outcomes
        .iter()
        .map(|o| o.to_audit_record(category))
        .collect();

    let failed = records.iter().filter(|r| r.error_detail.is_some()).count();
    tracing::info!(
        total = records.len(),
        failed,
        "batch complete"
    );
    Ok(records)
}

/// Opens every local file and builds the request.
fn build_request(
    category: DataType,
    user: &str,
    role: &str,
    paths: &[PathBuf],
) -> anyhow::Result<TransferRequest> {
    let files = paths
        .iter()
        .map(|path| {
            IncomingFile::open(path).with_context(|| format!("cannot open {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let context = MetadataContext::new(user, role, files.len());
    Ok(TransferRequest::new(category, context, files))
}

async fn upload<C: Connector + 'static>(
    connector: C,
    base: &str,
    writer: StreamWriter,
    request: TransferRequest,
) -> anyhow::Result<Vec<ecgupload_protocol::TransferOutcome>> {
    let (events_tx, events_rx) = mpsc::channel(64);
    let progress = tokio::spawn(report_progress(events_rx));

    let uploader = Arc::new(
        BatchUploader::new(connector, base)
            .with_writer(writer)
            .with_events(events_tx),
    );
    let result = uploader.spawn_batch(request).await;

    // The uploader (and its sender) is gone once the worker returns.
    let _ = progress.await;
    Ok(result?)
}

async fn report_progress(mut rx: mpsc::Receiver<BatchEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::FileStarted {
                index, filename, ..
            } => tracing::debug!(index, file = %filename, "uploading"),
            BatchEvent::FileUploaded {
                index,
                remote_path,
                bytes,
                ..
            } => tracing::debug!(index, path = %remote_path, bytes, "uploaded"),
            BatchEvent::FileFailed { index, error, .. } => {
                tracing::debug!(index, error = %error, "failed")
            }
            BatchEvent::BatchFinished {
                uploaded, failed, ..
            } => tracing::debug!(uploaded, failed, "finished"),
        }
    }
}

/// Writes one JSON audit record per line.
pub fn write_records<W: Write>(out: &mut W, records: &[AuditRecord]) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
