//! Deterministic remote directory layout.
//!
//! ```text
//! <base>/<category>/<YYYY>/<MM>/<sanitized-filename>
//! <base>/<category>/<YYYY>/<MM>/<sanitized-filename>.json
//! ```

use chrono::Datelike;
use ecgupload_protocol::DataType;

/// Dated directory shared by every file of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDestination {
    dir: String,
}

impl RemoteDestination {
    /// Resolves `<base>/<category>/<YYYY>/<MM>`.
    ///
    /// Trailing slashes on `base` are dropped, so `/landing/` and
    /// `/landing` resolve identically.
    pub fn resolve(base: &str, category: DataType, date: impl Datelike) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            dir: format!(
                "{base}/{category}/{:04}/{:02}",
                date.year(),
                date.month()
            ),
        }
    }

    /// The batch directory.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Remote path for an already sanitized filename.
    pub fn file_path(&self, sanitized_filename: &str) -> String {
        format!("{}/{}", self.dir, sanitized_filename)
    }
}

/// Remote path of the metadata sidecar for `remote_file_path`.
pub fn sidecar_path(remote_file_path: &str) -> String {
    format!("{remote_file_path}.json")
}
