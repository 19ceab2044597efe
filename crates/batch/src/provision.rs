//! Race-tolerant remote directory provisioning.

use ecgupload_transfer::RemoteFs;
use tracing::debug;

use crate::error::ProvisionError;

/// Ensures every segment of `full_path` exists as a directory.
///
/// Walks from the root, stat'ing each accumulated prefix and creating the
/// ones that are missing. A failed `mkdir` is logged and ignored: another
/// batch may have created the same directory between our stat and mkdir.
/// The full path is stat'ed once more at the end, and only if it is still
/// not a directory does the call fail.
///
/// Safe to call concurrently for the same path from independent sessions.
pub fn ensure_directory<F: RemoteFs + ?Sized>(
    remote: &F,
    full_path: &str,
) -> Result<(), ProvisionError> {
    let absolute = full_path.starts_with('/');
    let mut prefix = String::with_capacity(full_path.len());

    for segment in full_path.split('/').filter(|s| !s.is_empty()) {
        if absolute || !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        match remote.stat(&prefix) {
            Ok(stat) if stat.is_dir => {}
            Ok(_) => {
                return Err(ProvisionError {
                    path: prefix,
                    reason: "exists but is not a directory".into(),
                });
            }
            Err(_) => match remote.mkdir(&prefix) {
                Ok(()) => debug!(path = %prefix, "created remote directory"),
                Err(e) => {
                    debug!(path = %prefix, error = %e, "mkdir failed, assuming concurrent creation");
                }
            },
        }
    }

    if prefix.is_empty() {
        // Root (or empty) path: nothing to create.
        return Ok(());
    }

    match remote.stat(&prefix) {
        Ok(stat) if stat.is_dir => Ok(()),
        Ok(_) => Err(ProvisionError {
            path: prefix,
            reason: "exists but is not a directory".into(),
        }),
        Err(e) => Err(ProvisionError {
            path: prefix,
            reason: e.to_string(),
        }),
    }
}
