/*
 * error.rs
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

//! Client errors. Every failure is returned to the caller; none is fatal to the process.

use std::io;

use crate::protocol::http::Status;

/// Errors from connection setup, the request/response exchange, or the fetch layer.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Host lookup failed or returned no IPv4 address.
    #[error("unable to resolve {host}: {source}")]
    Dns {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Socket creation or TCP connect failed.
    #[error("unable to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },

    /// TLS client handshake failed (immediate or after 101 Switching Protocols).
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(#[source] io::Error),

    /// Server did not switch the connection to TLS when an upgrade was required.
    #[error("server does not support TLS upgrade")]
    UpgradeRefused,

    /// Socket or TLS write failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Socket or TLS read failed (distinct from a clean close).
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Malformed status line, header line, or chunk size.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Non-blocking connection has no body bytes yet; the exchange is still intact.
    #[error("no data available yet")]
    WouldBlock,

    /// Peer closed the connection while a response was still expected.
    #[error("connection closed before the response was complete")]
    PrematureClose,

    /// Operation needs an open socket.
    #[error("not connected")]
    NotConnected,

    /// URI could not be used for a request.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Redirect or retry budget exhausted.
    #[error("too many redirects or retries")]
    TooManyRedirects,

    /// Final response status was not 200 OK.
    #[error("HTTP {} {}", .0.code(), .0.reason())]
    Status(Status),
}

impl HttpError {
    /// Platform error code carried by the underlying I/O error, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            HttpError::Dns { source, .. }
            | HttpError::Connect { source, .. }
            | HttpError::TlsHandshake(source)
            | HttpError::Write(source)
            | HttpError::Read(source) => source.raw_os_error(),
            HttpError::PrematureClose => Some(libc::EPIPE),
            HttpError::WouldBlock => Some(libc::EWOULDBLOCK),
            _ => None,
        }
    }
}

/// A `Result` alias where the `Err` case is [`HttpError`].
pub type Result<T> = std::result::Result<T, HttpError>;
