/*
 * state.rs
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

//! Connection phase, protocol version, encryption policy and authentication scheme.

use std::fmt;

/// Phase of the current request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Waiting for a request (or the last response body was consumed).
    #[default]
    Idle,
    Options,
    Get,
    /// GET headers received; response body being read.
    GetSend,
    Head,
    Post,
    /// POST request body being written (or POST response body being read).
    PostRecv,
    /// POST request body complete.
    PostSend,
    Put,
    /// PUT request body being written.
    PutRecv,
    Delete,
    Trace,
    /// Socket closed.
    Closed,
}

impl State {
    /// Phase after the header block of a final response.
    pub(crate) fn after_headers(self) -> State {
        match self {
            State::Get => State::GetSend,
            State::Post => State::PostRecv,
            State::PostRecv => State::PostSend,
            State::Put => State::PutRecv,
            _ => State::Idle,
        }
    }

    /// Phase after a body transfer completes in either direction.
    pub(crate) fn after_body(self) -> State {
        match self {
            State::PostRecv => State::PostSend,
            _ => State::Idle,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Protocol version as `major * 100 + minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub u32);

impl Version {
    pub const HTTP_0_9: Version = Version(9);
    pub const HTTP_1_0: Version = Version(100);
    pub const HTTP_1_1: Version = Version(101);

    pub fn new(major: u32, minor: u32) -> Self {
        Version(major * 100 + minor)
    }

    pub fn major(self) -> u32 {
        self.0 / 100
    }

    pub fn minor(self) -> u32 {
        self.0 % 100
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major(), self.minor())
    }
}

/// When to encrypt the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionPolicy {
    /// Upgrade when the server answers 426 Upgrade Required.
    #[default]
    IfRequested,
    Never,
    /// Upgrade in place (RFC 2817) before the next request.
    Required,
    /// TLS from the first byte.
    Always,
}

impl EncryptionPolicy {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(EncryptionPolicy::IfRequested),
            1 => Some(EncryptionPolicy::Never),
            2 => Some(EncryptionPolicy::Required),
            3 => Some(EncryptionPolicy::Always),
            _ => None,
        }
    }
}

/// Authentication scheme in use on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    #[default]
    None,
    Basic,
    Md5,
    Md5Sess,
    Md5Int,
    Md5SessInt,
}
