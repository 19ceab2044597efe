//! Local-directory backend.
//!
//! Maps remote paths under a root directory so a batch can be staged on
//! disk through the same code path as an SFTP upload.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::remote::{Connector, RemoteFs, RemoteStat, RemoteWrite};
use crate::validation::validate_upload_path;
use crate::ConnectivityError;

/// [`RemoteFs`] rooted at a local directory.
///
/// `/landing/a.csv` resolves to `<root>/landing/a.csv`; paths that would
/// escape the root are rejected.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Ok(self.root.clone());
        }
        validate_upload_path(relative)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(self.root.join(relative))
    }
}

impl RemoteFs for LocalFs {
    fn stat(&self, path: &str) -> io::Result<RemoteStat> {
        let meta = fs::metadata(self.resolve(path)?)?;
        Ok(RemoteStat {
            is_dir: meta.is_dir(),
            size: Some(meta.len()),
        })
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path)?)
    }

    fn create(&self, path: &str) -> io::Result<Box<dyn RemoteWrite + '_>> {
        let file = fs::File::create(self.resolve(path)?)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path)?)
    }
}

impl RemoteWrite for BufWriter<fs::File> {
    fn close(self: Box<Self>) -> io::Result<()> {
        let file = (*self).into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }
}

/// Opens [`LocalFs`] sessions; fails like an unreachable host when the
/// root directory does not exist.
#[derive(Debug, Clone)]
pub struct LocalConnector {
    root: PathBuf,
}

impl LocalConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Connector for LocalConnector {
    type Session = LocalFs;

    fn open(&self) -> Result<LocalFs, ConnectivityError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(LocalFs::new(&self.root)),
            Ok(_) => Err(ConnectivityError::Unreachable {
                peer: self.peer(),
                reason: "not a directory".into(),
            }),
            Err(e) => Err(ConnectivityError::Unreachable {
                peer: self.peer(),
                reason: e.to_string(),
            }),
        }
    }

    fn peer(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
