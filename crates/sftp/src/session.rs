use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use ecgupload_transfer::{ConnectivityError, Connector, RemoteFs, RemoteStat, RemoteWrite};
use ssh2::{ErrorCode, File, HashType, Session, Sftp};
use tracing::{debug, info, warn};

use crate::config::SftpConfig;

/// libssh2's `LIBSSH2_ERROR_TIMEOUT`.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// Directory mode for directories created by the provisioner.
const DIR_MODE: i32 = 0o755;

/// Opens SFTP sessions against the configured server.
///
/// Holds no connection; share it between workers freely.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    config: SftpConfig,
}

impl SftpConnector {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SftpConfig {
        &self.config
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, ConnectivityError> {
        let addrs: Vec<SocketAddr> = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|e| ConnectivityError::Resolve {
                peer: self.peer(),
                reason: e.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ConnectivityError::Resolve {
                peer: self.peer(),
                reason: "no addresses found".into(),
            });
        }
        Ok(addrs)
    }

    /// Tries each resolved address in turn within the connect timeout.
    fn dial(&self, addrs: &[SocketAddr]) -> Result<TcpStream, ConnectivityError> {
        let timeout = self.config.connect_timeout();
        let mut last_err: Option<io::Error> = None;

        for addr in addrs {
            match TcpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    debug!(%addr, "TCP connected");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) if e.kind() == io::ErrorKind::TimedOut => {
                ConnectivityError::TimedOut { peer: self.peer() }
            }
            Some(e) => ConnectivityError::Unreachable {
                peer: self.peer(),
                reason: e.to_string(),
            },
            None => ConnectivityError::Unreachable {
                peer: self.peer(),
                reason: "no address to connect to".into(),
            },
        })
    }
}

impl Connector for SftpConnector {
    type Session = SftpSession;

    fn open(&self) -> Result<SftpSession, ConnectivityError> {
        let peer = self.peer();
        let addrs = self.resolve()?;
        let tcp = self.dial(&addrs)?;

        let mut session = Session::new().map_err(|e| ConnectivityError::Handshake {
            peer: peer.clone(),
            reason: e.to_string(),
        })?;
        session.set_timeout(timeout_ms(self.config.connect_timeout()));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| {
            if is_timeout(&e) {
                ConnectivityError::TimedOut { peer: peer.clone() }
            } else {
                ConnectivityError::Handshake {
                    peer: peer.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        // Trust on first use: the key is logged, never pinned.
        match session.host_key_hash(HashType::Sha256) {
            Some(hash) => info!(
                peer = %peer,
                fingerprint = %format!("SHA256:{}", hex::encode(hash)),
                "accepting server host key"
            ),
            None => warn!(peer = %peer, "server host key fingerprint unavailable"),
        }

        session
            .userauth_pubkey_file(
                &self.config.username,
                None,
                &self.config.key_path,
                self.config.key_passphrase.as_deref(),
            )
            .map_err(|e| {
                if is_timeout(&e) {
                    ConnectivityError::TimedOut { peer: peer.clone() }
                } else {
                    ConnectivityError::AuthRejected {
                        peer: peer.clone(),
                        user: self.config.username.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !session.authenticated() {
            return Err(ConnectivityError::AuthRejected {
                peer,
                user: self.config.username.clone(),
                reason: "server did not accept the key".into(),
            });
        }

        session.set_timeout(timeout_ms(self.config.io_timeout()));

        let sftp = session.sftp().map_err(|e| ConnectivityError::Channel {
            peer: peer.clone(),
            reason: e.to_string(),
        })?;

        info!(peer = %peer, "SFTP session opened");

        Ok(SftpSession {
            session,
            sftp: Some(sftp),
            peer,
        })
    }

    fn peer(&self) -> String {
        self.config.peer()
    }
}

/// An authenticated SFTP session owned by one batch.
///
/// Dropping the session closes the SFTP channel and disconnects, so every
/// exit path of the batch releases the connection.
pub struct SftpSession {
    session: Session,
    sftp: Option<Sftp>,
    peer: String,
}

impl SftpSession {
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn sftp(&self) -> io::Result<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "SFTP channel closed"))
    }
}

impl RemoteFs for SftpSession {
    fn stat(&self, path: &str) -> io::Result<RemoteStat> {
        let stat = self.sftp()?.stat(Path::new(path))?;
        Ok(RemoteStat {
            is_dir: stat.is_dir(),
            size: stat.size,
        })
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        self.sftp()?.mkdir(Path::new(path), DIR_MODE)?;
        Ok(())
    }

    fn create(&self, path: &str) -> io::Result<Box<dyn RemoteWrite + '_>> {
        let file = self.sftp()?.create(Path::new(path))?;
        Ok(Box::new(SftpFile(file)))
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        self.sftp()?.unlink(Path::new(path))?;
        Ok(())
    }
}

/// Remote file handle whose close result is checked.
///
/// libssh2 only reports a refused write (quota, lost connection) when the
/// handle is closed, and `ssh2::File` discards that result on drop.
struct SftpFile(File);

impl Write for SftpFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl RemoteWrite for SftpFile {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.0.close()?;
        Ok(())
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        // Close the channel before the transport goes away.
        drop(self.sftp.take());
        match self.session.disconnect(None, "upload batch finished", None) {
            Ok(()) => debug!(peer = %self.peer, "SFTP session closed"),
            Err(e) => debug!(peer = %self.peer, error = %e, "disconnect failed"),
        }
    }
}

fn is_timeout(e: &ssh2::Error) -> bool {
    matches!(e.code(), ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT))
}

/// libssh2 takes milliseconds as `u32`; 0 would mean "no timeout".
fn timeout_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn config_for(host: &str, port: u16) -> SftpConfig {
        SftpConfig {
            host: host.into(),
            port,
            username: "landing".into(),
            key_path: "/nonexistent/id_ed25519".into(),
            remote_path: "/landing".into(),
            connect_timeout_secs: 1,
            ..SftpConfig::default()
        }
    }

    #[test]
    fn refused_connection_is_unreachable() {
        // Grab a free port, then close it so nothing listens there.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let conn = SftpConnector::new(config_for("127.0.0.1", port));
        let err = conn.open().err().unwrap();
        assert!(
            matches!(err, ConnectivityError::Unreachable { .. }),
            "unexpected error: {err}"
        );
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }

    #[test]
    fn silent_server_fails_handshake() {
        // Accepts TCP (via the backlog) but never speaks SSH.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let conn = SftpConnector::new(config_for("127.0.0.1", port));
        let err = conn.open().err().unwrap();
        assert!(
            matches!(
                err,
                ConnectivityError::TimedOut { .. } | ConnectivityError::Handshake { .. }
            ),
            "unexpected error: {err}"
        );
        drop(listener);
    }

    #[test]
    fn unresolvable_host() {
        let conn = SftpConnector::new(config_for("landing.invalid", 22));
        let err = conn.open().err().unwrap();
        assert!(
            matches!(
                err,
                ConnectivityError::Resolve { .. } | ConnectivityError::Unreachable { .. }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn timeout_conversion() {
        assert_eq!(timeout_ms(Duration::from_secs(20)), 20_000);
        assert_eq!(timeout_ms(Duration::ZERO), 1);
        assert_eq!(timeout_ms(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn peer_comes_from_config() {
        let conn = SftpConnector::new(config_for("sftp.example.org", 2222));
        assert_eq!(conn.peer(), "landing@sftp.example.org:2222");
    }
}
