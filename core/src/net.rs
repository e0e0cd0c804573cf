/*
 * net.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of hdhttp, an HTTP/1.1 resource fetcher.
 *
 * hdhttp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hdhttp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hdhttp.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TLS for the blocking client: the backend seam and its rustls implementation.
//!
//! A backend turns a connected `TcpStream` into an encrypted session, either right after
//! connect (`https`, policy `Always`) or in place after `101 Switching Protocols`.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

/// An established TLS session over a TCP socket.
pub trait TlsSession: Read + Write + Send {
    /// Underlying socket (readiness polling, blocking mode).
    fn tcp(&self) -> &TcpStream;

    /// Send close_notify. The socket itself is closed when the session is dropped.
    fn shutdown(&mut self) -> io::Result<()>;

    /// Decrypted bytes held by the session that a read would return without touching the
    /// socket.
    fn pending_plaintext(&mut self) -> usize {
        0
    }
}

/// Performs the client side of a TLS handshake.
pub trait TlsBackend: Send + Sync {
    fn handshake(&self, host: &str, tcp: TcpStream) -> io::Result<Box<dyn TlsSession>>;
}

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs {
                let _ = root_store.add(cert);
            }
        }
        Err(e) => tracing::debug!(error = %e, "native root certificates unavailable"),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// TLS client config for HTTP/1.1 (ALPN `http/1.1`, no client auth).
pub fn http_client_config() -> Arc<ClientConfig> {
    let mut config = ClientConfig::builder()
        .with_root_certificates(build_root_store())
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(config)
}

/// rustls-backed TLS.
#[derive(Clone)]
pub struct RustlsBackend {
    config: Arc<ClientConfig>,
}

impl RustlsBackend {
    pub fn new() -> Self {
        Self::with_config(http_client_config())
    }

    pub fn with_config(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }
}

impl Default for RustlsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsBackend for RustlsBackend {
    fn handshake(&self, host: &str, mut tcp: TcpStream) -> io::Result<Box<dyn TlsSession>> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
        let mut conn = ClientConnection::new(self.config.clone(), server_name)
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
        while conn.is_handshaking() {
            conn.complete_io(&mut tcp)?;
        }
        tracing::debug!(
            alpn = ?conn.alpn_protocol().map(String::from_utf8_lossy),
            "TLS handshake complete"
        );
        Ok(Box::new(RustlsSession {
            inner: StreamOwned::new(conn, tcp),
        }))
    }
}

struct RustlsSession {
    inner: StreamOwned<ClientConnection, TcpStream>,
}

/// A peer that closes without close_notify ends the stream like a plain socket, as
/// `SSL_read` returning 0 always did. A body read until close can therefore be truncated
/// undetected, so it is logged.
fn end_without_close_notify(result: io::Result<usize>) -> io::Result<usize> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            tracing::warn!("TLS peer closed without close_notify; treating as end of stream");
            Ok(0)
        }
        other => other,
    }
}

impl Read for RustlsSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        end_without_close_notify(self.inner.read(buf))
    }
}

impl Write for RustlsSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl TlsSession for RustlsSession {
    fn tcp(&self) -> &TcpStream {
        self.inner.get_ref()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.inner.conn.send_close_notify();
        while self.inner.conn.wants_write() {
            self.inner.conn.write_tls(&mut self.inner.sock)?;
        }
        Ok(())
    }

    fn pending_plaintext(&mut self) -> usize {
        self.inner
            .conn
            .process_new_packets()
            .map_or(0, |state| state.plaintext_bytes_to_read())
    }
}
