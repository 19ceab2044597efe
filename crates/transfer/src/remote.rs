use std::io::{self, Write};

use crate::ConnectivityError;

/// Result of a remote `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub is_dir: bool,
    pub size: Option<u64>,
}

/// Write handle returned by [`RemoteFs::create`].
///
/// `flush` alone does not guarantee the remote side committed the file;
/// only a successful [`close`](Self::close) does. Dropping a handle without
/// closing it discards any close error.
pub trait RemoteWrite: Write {
    /// Flushes and closes the handle, reporting any failure of the final
    /// commit.
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

/// Directory and file operations on an open remote session.
///
/// Paths are `/`-separated remote paths. Implementations are used from a
/// single thread by the batch that opened them and need not be `Sync`.
pub trait RemoteFs {
    /// Returns metadata for `path`. Any error is treated as "absent" by the
    /// directory provisioner.
    fn stat(&self, path: &str) -> io::Result<RemoteStat>;

    /// Creates a single directory. Fails if it already exists or the parent
    /// is missing.
    fn mkdir(&self, path: &str) -> io::Result<()>;

    /// Opens `path` for writing, truncating any existing file.
    fn create(&self, path: &str) -> io::Result<Box<dyn RemoteWrite + '_>>;

    /// Removes a file.
    fn remove(&self, path: &str) -> io::Result<()>;
}

/// Opens authenticated sessions against one fixed remote peer.
///
/// A connector is plain configuration: it holds no live connection and is
/// shared freely between workers. Every call to [`open`](Self::open)
/// creates a new session owned by the caller; dropping the session closes
/// it.
pub trait Connector: Send + Sync {
    type Session: RemoteFs;

    /// Opens and authenticates a new session.
    fn open(&self) -> Result<Self::Session, ConnectivityError>;

    /// Human-readable peer description for logs (`user@host:port`).
    fn peer(&self) -> String;
}
