/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream and the request/response state machine over it.
//!
//! A request is sent with one of the `send_*` methods, then `update` is polled until it
//! returns something other than `Status::CONTINUE`. Body bytes move with `read`/`write`,
//! framed by the field table (`Content-Length` or `Transfer-Encoding: chunked`).

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddrV4, TcpStream};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{Credentials, DigestContext};
use crate::codec::truncate_to;
use crate::config::{ClientConfig, MAX_COOKIE, MAX_HOST, MAX_VALUE};
use crate::error::{HttpError, Result};
use crate::net::{TlsBackend, TlsSession};
use crate::protocol::http::buffer::{LineBuffer, LineRead};
use crate::protocol::http::field::{FieldName, FieldTable};
use crate::protocol::http::parser::{parse_chunk_size, parse_line, ResponseLine};
use crate::protocol::http::request::{request_head, Method};
use crate::protocol::http::state::{AuthType, EncryptionPolicy, State, Version};
use crate::protocol::http::status::Status;
use crate::protocol::http::transfer::{body_framing, BodyEncoding, ChunkStep, Remaining};
use crate::sys;
use crate::uri::encode_request_target;

/// Longest status or header line accepted in one piece.
const HEAD_LINE_MAX: usize = 1024;
/// Longest chunk-size line (size plus extensions).
const CHUNK_LINE_MAX: usize = MAX_VALUE;
/// Scratch size used when discarding a body.
const FLUSH_CHUNK: usize = 8192;

/// Unified stream: closed, plain TCP, or TLS.
enum Stream {
    Closed,
    Plain(TcpStream),
    Tls(Box<dyn TlsSession>),
}

impl Stream {
    fn tcp(&self) -> Option<&TcpStream> {
        match self {
            Stream::Closed => None,
            Stream::Plain(s) => Some(s),
            Stream::Tls(s) => Some(s.tcp()),
        }
    }

    fn is_tls(&self) -> bool {
        matches!(self, Stream::Tls(_))
    }

    fn is_closed(&self) -> bool {
        matches!(self, Stream::Closed)
    }

    /// Plaintext already decrypted by the TLS session.
    fn pending(&mut self) -> usize {
        match self {
            Stream::Tls(s) => s.pending_plaintext(),
            _ => 0,
        }
    }

    /// TLS close_notify (if any), then close the socket.
    fn shutdown(&mut self) {
        match std::mem::replace(self, Stream::Closed) {
            Stream::Closed => {}
            Stream::Plain(s) => {
                let _ = s.shutdown(Shutdown::Both);
            }
            Stream::Tls(mut s) => {
                if let Err(e) = s.shutdown() {
                    tracing::debug!(error = %e, "TLS shutdown failed");
                }
                let _ = s.tcp().shutdown(Shutdown::Both);
            }
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection is closed")
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Closed => Err(not_connected()),
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Closed => Err(not_connected()),
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Closed => Ok(()),
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

/// A client connection to one host.
pub struct Connection {
    stream: Stream,
    tls: Arc<dyn TlsBackend>,
    addr: SocketAddrV4,
    hostname: String,
    blocking: bool,
    /// Last platform error code (0 when the last operation succeeded).
    error: i32,
    activity: DateTime<Utc>,
    state: State,
    status: Status,
    version: Version,
    keep_alive: bool,
    encryption: EncryptionPolicy,
    auth_type: AuthType,
    credentials: Option<Credentials>,
    digest: Option<DigestContext>,
    /// Method of the outstanding request.
    method: Option<Method>,
    /// A request was sent and its final header block has not been read yet.
    awaiting_response: bool,
    encoding: BodyEncoding,
    remaining: Remaining,
    chunk: ChunkStep,
    buffer: LineBuffer,
    fields: FieldTable,
    /// Sent with every request until changed; longer than a field value may be.
    cookie: Option<String>,
}

impl Connection {
    /// Resolve `host`, connect, and apply the encryption policy (port 443 always uses TLS).
    pub fn connect(
        host: &str,
        port: u16,
        policy: EncryptionPolicy,
        config: &ClientConfig,
    ) -> Result<Connection> {
        let addr = sys::resolve_ipv4(host, port).map_err(|source| HttpError::Dns {
            host: host.to_string(),
            source,
        })?;
        let encryption = if port == 443 {
            EncryptionPolicy::Always
        } else {
            policy
        };
        let hostname = truncate_to(host, MAX_HOST - 1).to_string();
        let mut fields = FieldTable::new();
        fields.reset(&hostname);
        let mut conn = Connection {
            stream: Stream::Closed,
            tls: config.tls.clone(),
            addr,
            hostname,
            blocking: config.blocking,
            error: 0,
            activity: Utc::now(),
            state: State::Idle,
            status: Status::ERROR,
            version: Version::HTTP_1_1,
            keep_alive: true,
            encryption,
            auth_type: AuthType::None,
            credentials: None,
            digest: None,
            method: None,
            awaiting_response: false,
            encoding: BodyEncoding::Length,
            remaining: Remaining::Bounded(0),
            chunk: ChunkStep::Size,
            buffer: LineBuffer::new(),
            fields,
            cookie: None,
        };
        conn.reconnect()?;
        tracing::info!(host, port, address = %addr, encryption = ?conn.encryption, "connected");
        Ok(conn)
    }

    /// Close any current session and connect again to the resolved address.
    pub fn reconnect(&mut self) -> Result<()> {
        self.stream.shutdown();
        self.buffer.clear();
        self.awaiting_response = false;
        self.encoding = BodyEncoding::Length;
        self.remaining = Remaining::Bounded(0);
        self.chunk = ChunkStep::Size;

        let tcp = match sys::connect_ipv4(self.addr) {
            Ok(tcp) => tcp,
            Err(source) => {
                self.record_io(&source);
                self.status = Status::ERROR;
                self.state = State::Closed;
                return Err(HttpError::Connect {
                    host: self.hostname.clone(),
                    source,
                });
            }
        };
        if !self.blocking {
            if let Err(e) = tcp.set_nonblocking(true) {
                tracing::warn!(error = %e, "unable to make socket non-blocking");
            }
        }
        tracing::debug!(address = %self.addr, "socket connected");
        self.stream = Stream::Plain(tcp);
        self.error = 0;
        self.status = Status::CONTINUE;
        self.state = State::Idle;
        self.keep_alive = true;

        match self.encryption {
            EncryptionPolicy::Always => self.start_tls(),
            EncryptionPolicy::Required => self.upgrade(),
            _ => Ok(()),
        }
    }

    /// Graceful TLS shutdown, then close the socket. Digest state is discarded.
    pub fn close(&mut self) {
        if !self.stream.is_closed() {
            tracing::debug!(host = %self.hostname, "closing connection");
        }
        self.stream.shutdown();
        self.buffer.clear();
        self.digest = None;
        self.awaiting_response = false;
        self.state = State::Closed;
        self.status = Status::ERROR;
    }

    /// TLS handshake over the current plain socket.
    fn start_tls(&mut self) -> Result<()> {
        let tcp = match std::mem::replace(&mut self.stream, Stream::Closed) {
            Stream::Plain(tcp) => tcp,
            Stream::Closed => return Err(self.fail(HttpError::NotConnected)),
            tls @ Stream::Tls(_) => {
                self.stream = tls;
                return Ok(());
            }
        };
        match self.tls.handshake(&self.hostname, tcp) {
            Ok(session) => {
                tracing::info!(host = %self.hostname, "TLS established");
                self.stream = Stream::Tls(session);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(host = %self.hostname, error = %e, "TLS handshake failed");
                self.state = State::Closed;
                Err(self.fail(HttpError::TlsHandshake(e)))
            }
        }
    }

    /// Switch the open connection to TLS with `OPTIONS *` and `Upgrade` (RFC 2817).
    ///
    /// The caller's field table is preserved. If the server does not switch, the socket is
    /// closed and `UpgradeRefused` is returned.
    pub fn upgrade(&mut self) -> Result<()> {
        tracing::info!(host = %self.hostname, "requesting TLS upgrade");
        let saved = std::mem::take(&mut self.fields);
        self.fields.reset(&self.hostname);
        self.fields.set(FieldName::Connection, "upgrade");
        self.fields.set(FieldName::Upgrade, "TLS/1.0, SSL/2.0, SSL/3.0");

        let mut result = self.send(Method::Options, "*");
        if result.is_ok() {
            result = loop {
                match self.update() {
                    Ok(Status::CONTINUE) => continue,
                    Ok(_) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
        }
        if result.is_ok() {
            if let Err(e) = self.flush() {
                tracing::debug!(error = %e, "discarding upgrade response body failed");
            }
        }
        self.fields = saved;

        if !self.stream.is_tls() {
            tracing::warn!(host = %self.hostname, "server does not support TLS upgrade");
            self.stream.shutdown();
            self.state = State::Closed;
            self.status = Status::ERROR;
            return Err(HttpError::UpgradeRefused);
        }
        result
    }

    /// Change the encryption policy, reconnecting or upgrading when the link must change.
    pub fn set_encryption(&mut self, policy: EncryptionPolicy) -> Result<()> {
        self.encryption = policy;
        let tls = self.stream.is_tls();
        match policy {
            EncryptionPolicy::Always if !tls => self.reconnect(),
            EncryptionPolicy::Never if tls => self.reconnect(),
            EncryptionPolicy::Required if !tls => self.upgrade(),
            _ => Ok(()),
        }
    }

    pub fn send_options(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Options, uri)
    }

    pub fn send_get(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Get, uri)
    }

    pub fn send_head(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Head, uri)
    }

    /// POST; the request body is then streamed with `write`, framed by the fields set before sending.
    pub fn send_post(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Post, uri)
    }

    /// PUT; the request body is then streamed with `write`.
    pub fn send_put(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Put, uri)
    }

    pub fn send_delete(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Delete, uri)
    }

    pub fn send_trace(&mut self, uri: &str) -> Result<()> {
        self.send(Method::Trace, uri)
    }

    /// Write the request line and every set field, then reset the table to `Host`.
    fn send(&mut self, method: Method, uri: &str) -> Result<()> {
        let target = encode_request_target(uri);

        if self.status.is_error() || !self.keep_alive || self.stream.is_closed() {
            tracing::debug!(status = self.status.code(), "reconnecting before request");
            self.reconnect()?;
        }

        // Outgoing body framing; reconnecting resets it.
        if matches!(method, Method::Post | Method::Put) {
            self.content_length();
        }
        self.state = method.sending_state();
        self.method = Some(method);
        self.status = Status::CONTINUE;

        if self.encryption == EncryptionPolicy::Required && !self.stream.is_tls() {
            if !self.fields.is_set(FieldName::Connection) {
                self.fields.set(FieldName::Connection, "Upgrade");
            }
            if !self.fields.is_set(FieldName::Upgrade) {
                self.fields.set(FieldName::Upgrade, "TLS/1.0,SSL/2.0,SSL/3.0");
            }
        }
        self.apply_authorization(method, &target);

        let head = request_head(method, &target, &self.fields, self.cookie.as_deref());
        tracing::debug!(method = method.as_str(), target = %target, "sending request");
        for (name, value) in self.fields.iter() {
            if name == FieldName::Authorization {
                tracing::trace!(field = name.as_str(), "<redacted>");
            } else {
                tracing::trace!(field = name.as_str(), value, "request field");
            }
        }
        if let Err(e) = self.write_all(head.as_bytes()) {
            return Err(self.fail(HttpError::Write(e)));
        }

        self.fields.reset(&self.hostname);
        self.awaiting_response = true;
        Ok(())
    }

    /// Credentials become an Authorization field unless the caller set one.
    fn apply_authorization(&mut self, method: Method, target: &str) {
        if self.fields.is_set(FieldName::Authorization) {
            return;
        }
        let Some(credentials) = &self.credentials else {
            return;
        };
        let value = match &mut self.digest {
            Some(digest) => {
                self.auth_type = AuthType::Md5;
                digest.authorization(method.as_str(), target)
            }
            None => {
                self.auth_type = AuthType::Basic;
                credentials.basic_authorization()
            }
        };
        self.fields.set(FieldName::Authorization, &value);
    }

    /// Read response lines until a complete header block has been parsed.
    ///
    /// Returns `Status::CONTINUE` for interim responses, after an in-place TLS upgrade, when
    /// no request is outstanding, and when a non-blocking socket has no data yet.
    pub fn update(&mut self) -> Result<Status> {
        if !self.awaiting_response {
            return Ok(Status::CONTINUE);
        }
        if self.stream.is_closed() {
            return Err(self.fail(HttpError::NotConnected));
        }
        loop {
            let line = match self.buffer.read_line(&mut self.stream, HEAD_LINE_MAX) {
                Ok(LineRead::Line(line)) => line,
                Ok(LineRead::Eof) => return Err(self.fail_premature_close()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && !self.blocking => {
                    return Ok(Status::CONTINUE);
                }
                Err(e) => return Err(self.fail(HttpError::Read(e))),
            };
            self.touch();

            match parse_line(&line) {
                Some(ResponseLine::End) => return self.end_of_head(),
                Some(ResponseLine::Status { version, status }) => {
                    tracing::debug!(%version, status = status.code(), "response status");
                    self.version = version;
                    self.status = status;
                }
                Some(ResponseLine::Field { name, value }) => {
                    tracing::trace!(field = name.as_str(), value, "response field");
                    self.fields.set(name, value);
                }
                Some(ResponseLine::Unknown { name }) => {
                    tracing::debug!(field = name, "ignoring unknown field");
                }
                None => {
                    return Err(self.fail(HttpError::Protocol(format!(
                        "malformed response line {:?}",
                        line
                    ))));
                }
            }
        }
    }

    /// Blank line after a header block.
    fn end_of_head(&mut self) -> Result<Status> {
        if self.status == Status::CONTINUE {
            return Ok(Status::CONTINUE);
        }
        if self.status == Status::SWITCHING_PROTOCOLS && !self.stream.is_tls() {
            self.start_tls()?;
            return Ok(Status::CONTINUE);
        }
        if self.status == Status::UPGRADE_REQUIRED && self.encryption != EncryptionPolicy::Never {
            tracing::info!(host = %self.hostname, "server requires TLS; upgrading before next request");
            self.encryption = EncryptionPolicy::Required;
        }

        self.content_length();
        if self.method == Some(Method::Head) || self.status.has_no_body() {
            self.encoding = BodyEncoding::Length;
            self.remaining = Remaining::Bounded(0);
        }
        self.keep_alive = self.response_keeps_alive();
        if self.status == Status::UNAUTHORIZED {
            self.observe_challenge();
        }

        let next = self.state.after_headers();
        tracing::debug!(from = ?self.state, to = ?next, status = self.status.code(), "response headers complete");
        self.state = next;
        self.awaiting_response = false;
        Ok(self.status)
    }

    fn response_keeps_alive(&self) -> bool {
        let connection = self.fields.get(FieldName::Connection);
        if connection.eq_ignore_ascii_case("close") {
            return false;
        }
        self.version >= Version::HTTP_1_1 || connection.eq_ignore_ascii_case("keep-alive")
    }

    /// Cookie string for every following request (truncated to `MAX_COOKIE - 1` bytes).
    /// None or an empty string stops sending it.
    pub fn set_cookie(&mut self, cookie: Option<&str>) {
        self.cookie = cookie
            .filter(|c| !c.is_empty())
            .map(|c| truncate_to(c, MAX_COOKIE - 1).to_string());
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Create or refresh the digest context from a 401 challenge.
    fn observe_challenge(&mut self) {
        let Some(credentials) = &self.credentials else {
            return;
        };
        let challenge = self.fields.get(FieldName::WwwAuthenticate);
        let Some(ctx) = DigestContext::from_challenge(challenge, credentials) else {
            return;
        };
        let fresh = self
            .digest
            .as_ref()
            .map_or(true, |d| d.nonce() != ctx.nonce());
        if fresh {
            tracing::info!(realm = ctx.realm(), "digest challenge received");
            self.digest = Some(ctx);
            self.auth_type = AuthType::Md5;
        }
    }

    /// Recompute body framing from the current field table.
    pub fn content_length(&mut self) -> Remaining {
        let (encoding, remaining) = body_framing(&self.fields);
        self.encoding = encoding;
        self.remaining = remaining;
        self.chunk = ChunkStep::Size;
        remaining
    }

    /// Read body bytes. Ok(0) means the body is complete (the state has moved on).
    ///
    /// On a non-blocking connection with nothing received yet this returns
    /// `HttpError::WouldBlock` and leaves the exchange as it was; call again later.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.touch();
        match self.read_body(buf) {
            Ok(n) => Ok(n),
            Err(HttpError::Read(e)) if e.kind() == io::ErrorKind::WouldBlock && !self.blocking => {
                self.record_io(&e);
                Err(HttpError::WouldBlock)
            }
            Err(HttpError::PrematureClose) => Err(self.fail_premature_close()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.encoding == BodyEncoding::Chunked {
            loop {
                match self.chunk {
                    ChunkStep::Data => break,
                    ChunkStep::DataEnd => {
                        self.read_body_line()?;
                        self.chunk = ChunkStep::Size;
                    }
                    ChunkStep::Size => {
                        let line = self.read_body_line()?;
                        let size = parse_chunk_size(&line)
                            .ok_or_else(|| HttpError::Protocol(format!("bad chunk size {:?}", line)))?;
                        tracing::trace!(size, "chunk");
                        if size == 0 {
                            self.chunk = ChunkStep::Trailer;
                        } else {
                            self.remaining = Remaining::Bounded(size);
                            self.chunk = ChunkStep::Data;
                        }
                    }
                    ChunkStep::Trailer => {
                        if self.read_body_line()?.is_empty() {
                            self.finish_body();
                            return Ok(0);
                        }
                    }
                }
            }
        } else if self.remaining.is_zero() {
            self.finish_body();
            return Ok(0);
        }

        let want = self.remaining.limit(buf.len());
        let n = self
            .buffer
            .read_bytes(&mut self.stream, &mut buf[..want])
            .map_err(HttpError::Read)?;
        if n == 0 {
            if self.remaining == Remaining::UntilClose {
                tracing::debug!("body ended by connection close");
                self.keep_alive = false;
                self.finish_body();
                return Ok(0);
            }
            return Err(HttpError::PrematureClose);
        }
        self.remaining.consume(n);

        if self.remaining.is_zero() {
            if self.encoding == BodyEncoding::Chunked {
                self.chunk = ChunkStep::DataEnd;
            } else {
                self.finish_body();
            }
        }
        Ok(n)
    }

    fn read_body_line(&mut self) -> Result<String> {
        match self.buffer.read_line(&mut self.stream, CHUNK_LINE_MAX) {
            Ok(LineRead::Line(line)) => Ok(line),
            Ok(LineRead::Eof) => Err(HttpError::PrematureClose),
            Err(e) => Err(HttpError::Read(e)),
        }
    }

    fn finish_body(&mut self) {
        let next = self.state.after_body();
        tracing::debug!(from = ?self.state, to = ?next, "body complete");
        self.state = next;
        self.remaining = Remaining::Bounded(0);
        self.chunk = ChunkStep::Size;
    }

    /// Write request body bytes. With chunked framing each call is one chunk and an empty
    /// slice ends the body.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.touch();
        if self.encoding == BodyEncoding::Chunked {
            if let Err(e) = self.write_all(format!("{:x}\r\n", data.len()).as_bytes()) {
                return Err(self.fail(HttpError::Write(e)));
            }
            if data.is_empty() {
                self.finish_body();
                if let Err(e) = self.write_all(b"\r\n") {
                    return Err(self.fail(HttpError::Write(e)));
                }
                return Ok(0);
            }
        }

        if let Err(e) = self.write_all(data) {
            return Err(self.fail(HttpError::Write(e)));
        }

        match self.encoding {
            BodyEncoding::Chunked => {
                if let Err(e) = self.write_all(b"\r\n") {
                    return Err(self.fail(HttpError::Write(e)));
                }
            }
            BodyEncoding::Length => {
                self.remaining.consume(data.len());
                if self.remaining.is_zero() {
                    self.finish_body();
                }
            }
        }
        Ok(data.len())
    }

    /// Write a raw string (no framing).
    pub fn write_str(&mut self, s: &str) -> Result<usize> {
        match self.write_all(s.as_bytes()) {
            Ok(()) => Ok(s.len()),
            Err(e) => Err(self.fail(HttpError::Write(e))),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    /// Read and discard the rest of the current body, waiting for data on a non-blocking
    /// connection.
    pub fn flush(&mut self) -> Result<()> {
        let mut scratch = vec![0u8; FLUSH_CHUNK];
        loop {
            match self.read(&mut scratch) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(HttpError::WouldBlock) => {
                    self.wait(-1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// True when response data is buffered (here or in the TLS session) or the socket is
    /// readable. Never blocks.
    pub fn check(&mut self) -> bool {
        self.wait(0)
    }

    /// Wait up to `timeout_ms` milliseconds (negative waits forever) for response data.
    pub fn wait(&mut self, timeout_ms: i32) -> bool {
        if !self.buffer.is_empty() || self.stream.pending() > 0 {
            return true;
        }
        self.stream
            .tcp()
            .map_or(false, |tcp| sys::wait_readable(tcp, timeout_ms))
    }

    pub fn get_field(&self, field: FieldName) -> &str {
        self.fields.get(field)
    }

    pub fn set_field(&mut self, field: FieldName, value: &str) {
        self.fields.set(field, value);
    }

    /// Clear every field and seed `Host` with the connected host name.
    pub fn clear_fields(&mut self) {
        self.fields.reset(&self.hostname);
    }

    /// Parameter `name` inside a field value, e.g. `realm` of `WWW-Authenticate`.
    pub fn get_sub_field(&self, field: FieldName, name: &str) -> Option<String> {
        self.fields.sub_field(field, name)
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Credentials for Basic, or Digest once the server has sent a challenge.
    pub fn set_credentials(&mut self, user: &str, password: &str) {
        self.credentials = Some(Credentials::new(user, password));
        if self.digest.is_none() {
            self.auth_type = AuthType::Basic;
        }
    }

    pub fn has_digest_challenge(&self) -> bool {
        self.digest.is_some()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Last platform error code, 0 if none.
    pub fn error_code(&self) -> i32 {
        self.error
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn encryption(&self) -> EncryptionPolicy {
        self.encryption
    }

    pub fn is_encrypted(&self) -> bool {
        self.stream.is_tls()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.activity
    }

    pub fn body_encoding(&self) -> BodyEncoding {
        self.encoding
    }

    pub fn remaining(&self) -> Remaining {
        self.remaining
    }

    pub fn blocking(&self) -> bool {
        self.blocking
    }

    pub fn set_blocking(&mut self, blocking: bool) {
        self.blocking = blocking;
        if let Some(tcp) = self.stream.tcp() {
            if let Err(e) = tcp.set_nonblocking(!blocking) {
                tracing::warn!(error = %e, "unable to change blocking mode");
            }
        }
    }

    fn touch(&mut self) {
        self.activity = Utc::now();
    }

    fn record_io(&mut self, e: &io::Error) {
        self.error = e.raw_os_error().unwrap_or(-1);
    }

    /// Mark the exchange failed and hand the error back.
    fn fail(&mut self, err: HttpError) -> HttpError {
        if let Some(code) = err.os_code() {
            self.error = code;
        }
        self.status = Status::ERROR;
        self.awaiting_response = false;
        tracing::debug!(error = %err, "exchange failed");
        err
    }

    fn fail_premature_close(&mut self) -> HttpError {
        let err = self.fail(HttpError::PrematureClose);
        if !self.blocking {
            self.error = 0;
        }
        err
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stream.shutdown();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("hostname", &self.hostname)
            .field("address", &self.addr)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("encrypted", &self.stream.is_tls())
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}
