use std::io::{self, Write};

use ecgupload_protocol::SidecarMetadata;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::layout::sidecar_path;
use crate::remote::RemoteFs;
use crate::source::UploadSource;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Summary of a completed primary-file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub bytes_written: u64,
    /// SHA-256 hex digest of the streamed bytes.
    pub sha256: String,
}

/// Streams one source into a remote file through a fixed-size buffer.
///
/// Memory use is bounded by the chunk size regardless of file size.
#[derive(Debug, Clone)]
pub struct StreamWriter {
    chunk_size: usize,
    max_file_bytes: Option<u64>,
}

impl Default for StreamWriter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl StreamWriter {
    /// Creates a writer. A `chunk_size` of 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            chunk_size,
            max_file_bytes: None,
        }
    }

    /// Sets the per-file size limit (`None` = unlimited).
    pub fn with_max_file_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_file_bytes = limit;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_file_bytes(&self) -> Option<u64> {
        self.max_file_bytes
    }

    /// Rejects a file whose declared size already exceeds the limit, before
    /// any remote interaction.
    pub fn check_declared_size(&self, declared: Option<u64>) -> Result<(), TransferError> {
        match (self.max_file_bytes, declared) {
            (Some(limit), Some(size)) if size > limit => Err(TransferError::TooLarge {
                limit,
                bytes_written: 0,
            }),
            _ => Ok(()),
        }
    }

    /// Rewinds `source` and streams it into `remote_file_path`.
    ///
    /// The remote handle is closed explicitly and a failed close fails the
    /// transfer. On failure the partially written remote file is removed
    /// best-effort; the returned error reports how many bytes had already
    /// been sent.
    pub fn write_file<F: RemoteFs + ?Sized>(
        &self,
        remote: &F,
        source: &mut dyn UploadSource,
        remote_file_path: &str,
    ) -> Result<WriteReport, TransferError> {
        source.rewind().map_err(TransferError::Rewind)?;

        let mut out = remote
            .create(remote_file_path)
            .map_err(|e| TransferError::Remote {
                path: remote_file_path.to_string(),
                bytes_written: 0,
                source: e,
            })?;

        let result = self
            .pump(source, &mut *out, remote_file_path)
            .and_then(|report| match out.close() {
                Ok(()) => Ok(report),
                Err(e) => Err(TransferError::Remote {
                    path: remote_file_path.to_string(),
                    bytes_written: report.bytes_written,
                    source: e,
                }),
            });

        match &result {
            Ok(report) => {
                debug!(
                    path = %remote_file_path,
                    bytes = report.bytes_written,
                    "file streamed"
                );
            }
            Err(e) => {
                if let Err(rm) = remote.remove(remote_file_path) {
                    debug!(path = %remote_file_path, error = %rm, "could not remove partial file");
                }
                warn!(path = %remote_file_path, error = %e, "file transfer failed");
            }
        }

        result
    }

    fn pump<W: Write + ?Sized>(
        &self,
        source: &mut dyn UploadSource,
        out: &mut W,
        remote_file_path: &str,
    ) -> Result<WriteReport, TransferError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;

        let remote_err = |written: u64, e: io::Error| TransferError::Remote {
            path: remote_file_path.to_string(),
            bytes_written: written,
            source: e,
        };

        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TransferError::Source {
                        bytes_written: written,
                        source: e,
                    });
                }
            };

            if let Some(limit) = self.max_file_bytes
                && written + n as u64 > limit
            {
                return Err(TransferError::TooLarge {
                    limit,
                    bytes_written: written,
                });
            }

            out.write_all(&buf[..n]).map_err(|e| remote_err(written, e))?;
            hasher.update(&buf[..n]);
            written += n as u64;
        }

        out.flush().map_err(|e| remote_err(written, e))?;

        Ok(WriteReport {
            bytes_written: written,
            sha256: hex::encode(hasher.finalize()),
        })
    }

    /// Writes the JSON sidecar next to `remote_file_path` and returns its
    /// path.
    pub fn write_sidecar<F: RemoteFs + ?Sized>(
        &self,
        remote: &F,
        remote_file_path: &str,
        metadata: &SidecarMetadata,
    ) -> Result<String, TransferError> {
        let path = sidecar_path(remote_file_path);
        let body = metadata.to_pretty_json()?;

        let remote_err = |e: io::Error| TransferError::Remote {
            path: path.clone(),
            bytes_written: 0,
            source: e,
        };

        let mut out = remote.create(&path).map_err(remote_err)?;
        out.write_all(&body).map_err(remote_err)?;
        out.close().map_err(remote_err)?;

        Ok(path)
    }
}
