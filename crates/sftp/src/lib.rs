//! SSH/SFTP transport for the upload relay.
//!
//! [`SftpConnector`] holds connection settings only; each call to
//! [`Connector::open`](ecgupload_transfer::Connector::open) dials the
//! server, authenticates with a private key and returns an
//! [`SftpSession`] that closes itself when dropped.
//!
//! Unknown host keys are accepted on first use. The host key fingerprint
//! is logged on every connect so operators can audit it.

mod config;
mod session;

pub use config::{SftpConfig, SftpConfigError};
pub use session::{SftpConnector, SftpSession};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default timeout for TCP connect, handshake and authentication.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;

/// Default timeout for every remote operation once connected.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 300;
