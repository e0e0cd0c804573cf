/*
 * request.rs
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

//! HTTP request: method and the serialized request head.
//!
//! The head is the request line followed by every non-empty field of the table, in
//! field order, and the blank line that ends it.

use std::fmt;
use std::fmt::Write as _;

use super::field::{FieldName, FieldTable};
use super::state::State;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
        }
    }

    /// State entered once the head is written. POST and PUT bodies are streamed by the caller.
    pub(crate) fn sending_state(&self) -> State {
        match self {
            Method::Options => State::Options,
            Method::Get => State::Get,
            Method::Head => State::Head,
            Method::Post => State::PostRecv,
            Method::Put => State::PutRecv,
            Method::Delete => State::Delete,
            Method::Trace => State::Trace,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `METHOD target HTTP/1.1`, the field lines, and the terminating blank line.
///
/// `cookie` is sent as a `Cookie` line after the fields unless the table already has one.
pub fn request_head(method: Method, target: &str, fields: &FieldTable, cookie: Option<&str>) -> String {
    let mut head = String::with_capacity(256);
    let _ = write!(head, "{} {} HTTP/1.1\r\n", method.as_str(), target);
    for (name, value) in fields.iter() {
        let _ = write!(head, "{}: {}\r\n", name.as_str(), value);
    }
    if let Some(cookie) = cookie.filter(|_| !fields.is_set(FieldName::Cookie)) {
        let _ = write!(head, "Cookie: {}\r\n", cookie);
    }
    head.push_str("\r\n");
    head
}
