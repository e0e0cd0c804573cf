/*
 * buffer.rs
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

//! Fixed-capacity receive buffer shared by line reads (response head, chunk sizes) and
//! raw byte reads (body data).

use std::io::{self, Read};

use bytes::{Buf, BytesMut};

use crate::config::MAX_BUFFER;

/// Receives spent on a repeated error code within one call before it is surfaced.
const MAX_STALL_POLLS: usize = 3;

/// Result of a line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// Line without its terminator.
    Line(String),
    /// Peer closed the connection before a complete line arrived.
    Eof,
}

/// Receive buffer. Never holds more than `MAX_BUFFER` unconsumed bytes.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Code of the previous receive error. A repeat of it is a stall and is polled again; a
    /// different code is surfaced. Cleared by a successful receive.
    last_error: Option<i32>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_BUFFER),
            last_error: None,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop buffered bytes and the remembered error (used on reconnect).
    pub fn clear(&mut self) {
        self.buf.clear();
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<i32> {
        self.last_error
    }

    fn has_newline(&self) -> bool {
        self.buf.iter().any(|&b| b == b'\n')
    }

    /// One receive appended to the buffer. Ok(0) means the peer closed.
    fn fill_once<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<usize> {
        let used = self.buf.len();
        let room = MAX_BUFFER - used;
        self.buf.resize(MAX_BUFFER, 0);
        let result = loop {
            match src.read(&mut self.buf[used..used + room]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        let n = *result.as_ref().unwrap_or(&0);
        self.buf.truncate(used + n);
        result
    }

    /// Remember a receive error and decide whether to poll again.
    ///
    /// The same code as the previous error is a stall (at most `MAX_STALL_POLLS` times per
    /// call); a changed code is surfaced. `WouldBlock` is always surfaced.
    fn stalled(&mut self, e: &io::Error, polls: &mut usize) -> bool {
        if e.kind() == io::ErrorKind::WouldBlock {
            return false;
        }
        let code = e.raw_os_error().unwrap_or(-1);
        let repeated = self.last_error == Some(code);
        self.last_error = Some(code);
        if repeated && *polls < MAX_STALL_POLLS {
            *polls += 1;
            tracing::debug!(code, "receive stalled, polling again");
            return true;
        }
        false
    }

    /// Receive until a newline is buffered or the buffer is full.
    ///
    /// Returns false when the peer closed first.
    pub fn fill_if_needed<R: Read + ?Sized>(&mut self, src: &mut R) -> io::Result<bool> {
        let mut polls = 0;
        while !self.has_newline() && self.buf.len() < MAX_BUFFER {
            match self.fill_once(src) {
                Ok(0) => return Ok(false),
                Ok(_) => self.last_error = None,
                Err(e) => {
                    if self.stalled(&e, &mut polls) {
                        continue;
                    }
                    return Err(e);
                }
            }
        }
        Ok(true)
    }

    /// Next line of at most `max_len` bytes, with the `\n` terminator and a preceding `\r` removed.
    ///
    /// A line longer than `max_len` is returned in pieces. A full buffer without any newline is
    /// returned as a line so the caller always makes progress.
    pub fn read_line<R: Read + ?Sized>(&mut self, src: &mut R, max_len: usize) -> io::Result<LineRead> {
        if !self.fill_if_needed(src)? && !self.has_newline() {
            return Ok(LineRead::Eof);
        }
        let max_len = max_len.max(1);
        let (take, content) = match self.buf.iter().position(|&b| b == b'\n') {
            Some(nl) if nl < max_len => (nl + 1, nl),
            _ => {
                let n = max_len.min(self.buf.len());
                (n, n)
            }
        };
        let mut line = &self.buf[..content];
        if take > content && line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        let line = String::from_utf8_lossy(line).into_owned();
        self.buf.advance(take);
        Ok(LineRead::Line(line))
    }

    /// Copy up to `out.len()` bytes: buffered bytes first, otherwise one receive straight into `out`.
    /// Ok(0) means the peer closed (or `out` is empty).
    pub fn read_bytes<R: Read + ?Sized>(&mut self, src: &mut R, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if !self.buf.is_empty() {
            let n = out.len().min(self.buf.len());
            out[..n].copy_from_slice(&self.buf[..n]);
            self.buf.advance(n);
            return Ok(n);
        }
        let mut polls = 0;
        loop {
            match src.read(out) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if self.stalled(&e, &mut polls) {
                        continue;
                    }
                    return Err(e);
                }
                Ok(n) => {
                    self.last_error = None;
                    return Ok(n);
                }
            }
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
