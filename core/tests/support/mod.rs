/*
 * support/mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Shared helpers for the integration tests: scripted loopback servers and
 * TLS test doubles.
 */

#![allow(dead_code)]

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hdhttp_core::net::{TlsBackend, TlsSession};
use hdhttp_core::ClientConfig;

/// Install a test subscriber once; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Server on 127.0.0.1 running `handler(connection_number, stream)` on its own thread for
/// every accepted connection. Connection numbers start at 1.
pub struct Server {
    pub port: u16,
    accepts: Arc<AtomicUsize>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Server {
    pub fn spawn<F>(handler: F) -> Server
    where
        F: Fn(usize, Peer) + Send + Sync + 'static,
    {
        init_logging();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let accepts = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);
        {
            let accepts = accepts.clone();
            let log = log.clone();
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    let n = accepts.fetch_add(1, Ordering::SeqCst) + 1;
                    let handler = handler.clone();
                    let peer = Peer::new(stream, log.clone());
                    thread::spawn(move || handler(n, peer));
                }
            });
        }
        Server { port, accepts, log }
    }

    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    /// Every request line and header line received so far, across connections.
    pub fn lines(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

/// Server side of one accepted connection.
pub struct Peer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    log: Arc<Mutex<Vec<String>>>,
}

impl Peer {
    fn new(stream: TcpStream, log: Arc<Mutex<Vec<String>>>) -> Self {
        let writer = stream.try_clone().expect("clone stream");
        Peer {
            reader: BufReader::new(stream),
            writer,
            log,
        }
    }

    /// Request line and header lines (without CRLF), or None once the client hung up.
    pub fn read_head(&mut self) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            if line.is_empty() {
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            if let Ok(mut log) = self.log.lock() {
                log.push(line.clone());
            }
            lines.push(line);
        }
        Some(lines)
    }

    pub fn read_exact(&mut self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        self.reader.read_exact(&mut buf).expect("request body");
        buf
    }

    /// Read until `terminator` has been seen; returns everything read.
    pub fn read_until_seq(&mut self, terminator: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        while !out.ends_with(terminator) {
            match self.reader.read(&mut byte) {
                Ok(1) => out.push(byte[0]),
                _ => break,
            }
        }
        out
    }

    pub fn send(&mut self, data: &[u8]) {
        let _ = self.writer.write_all(data);
        let _ = self.writer.flush();
    }

    pub fn send_str(&mut self, data: &str) {
        self.send(data.as_bytes());
    }

    pub fn pause(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    pub fn close(self) {
        let _ = self.writer.shutdown(std::net::Shutdown::Both);
    }
}

/// Header value from a head returned by `read_head`, case-insensitive on the name.
pub fn header<'a>(head: &'a [String], name: &str) -> Option<&'a str> {
    head.iter().skip(1).find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

/// TLS stand-in: "handshakes" without encrypting so loopback servers can keep speaking
/// plain HTTP after 101 Switching Protocols.
#[derive(Default)]
pub struct PassThroughTls {
    pub handshakes: AtomicUsize,
}

struct PassThroughSession(TcpStream);

impl Read for PassThroughSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for PassThroughSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl TlsSession for PassThroughSession {
    fn tcp(&self) -> &TcpStream {
        &self.0
    }

    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TlsBackend for PassThroughTls {
    fn handshake(&self, _host: &str, tcp: TcpStream) -> io::Result<Box<dyn TlsSession>> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(PassThroughSession(tcp)))
    }
}

/// Pass-through TLS whose session always reports decrypted bytes waiting to be read.
pub struct BufferedTls;

struct BufferedSession(PassThroughSession);

impl Read for BufferedSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for BufferedSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl TlsSession for BufferedSession {
    fn tcp(&self) -> &TcpStream {
        self.0.tcp()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn pending_plaintext(&mut self) -> usize {
        1
    }
}

impl TlsBackend for BufferedTls {
    fn handshake(&self, _host: &str, tcp: TcpStream) -> io::Result<Box<dyn TlsSession>> {
        Ok(Box::new(BufferedSession(PassThroughSession(tcp))))
    }
}

/// TLS backend whose handshake always fails.
pub struct FailingTls;

impl TlsBackend for FailingTls {
    fn handshake(&self, _host: &str, _tcp: TcpStream) -> io::Result<Box<dyn TlsSession>> {
        Err(io::Error::new(io::ErrorKind::ConnectionAborted, "handshake rejected"))
    }
}

pub fn plain_config() -> ClientConfig {
    ClientConfig::new()
}

pub fn pass_through_config() -> (ClientConfig, Arc<PassThroughTls>) {
    let tls = Arc::new(PassThroughTls::default());
    (ClientConfig::new().with_tls(tls.clone()), tls)
}
