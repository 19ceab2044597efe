//! Rewindable byte sources for incoming files.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::Path;

/// A byte stream that can be repositioned at its start.
///
/// Upstream code (validation, content sniffing) may already have consumed
/// part of the stream. The writer calls [`rewind`](Self::rewind) exactly
/// once before streaming, so implementors must make it restore offset zero
/// rather than continue from the current position.
pub trait UploadSource: Read + Send {
    /// Moves the read position back to offset zero.
    fn rewind(&mut self) -> io::Result<()>;
}

impl UploadSource for File {
    fn rewind(&mut self) -> io::Result<()> {
        Seek::rewind(self)
    }
}

impl<T: AsRef<[u8]> + Send> UploadSource for Cursor<T> {
    fn rewind(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }
}

impl<R: Read + Seek + Send> UploadSource for BufReader<R> {
    fn rewind(&mut self) -> io::Result<()> {
        // Seeking a BufReader discards its buffer.
        Seek::rewind(self)
    }
}

/// One file of a transfer request: client-supplied name, byte stream and
/// optional declared size.
pub struct IncomingFile {
    pub filename: String,
    pub declared_size: Option<u64>,
    source: Box<dyn UploadSource>,
}

impl IncomingFile {
    pub fn new(filename: impl Into<String>, source: impl UploadSource + 'static) -> Self {
        Self {
            filename: filename.into(),
            declared_size: None,
            source: Box::new(source),
        }
    }

    /// In-memory file, mostly useful for tests and small payloads.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self::new(filename, Cursor::new(data)).with_declared_size(size)
    }

    /// Opens a local file, taking its name and size from the filesystem.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, BufReader::new(file)).with_declared_size(size))
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn source_mut(&mut self) -> &mut dyn UploadSource {
        self.source.as_mut()
    }
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("filename", &self.filename)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}
