/*
 * uri.rs
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

//! URI separation (scheme, userinfo, host, port, resource) and request-target encoding.
//!
//! Separation is lenient in the historical way: `//host/path` means `http`, and
//! `hostname:port/path` (a "scheme" containing a dot) is read as an `http` authority.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, CONTROLS};

use crate::codec::truncate_to;
use crate::config::{MAX_HOST, MAX_URI};

/// Bytes escaped in a request-target: controls, space, DEL and everything above 0x7F.
const REQUEST_TARGET: &AsciiSet = &CONTROLS.add(b' ');

/// Components of a separated URI. `port` is 0 when unknown or not applicable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: String,
    /// Userinfo as written (`user` or `user:password`), still percent-encoded.
    pub username: String,
    pub host: String,
    pub port: u16,
    pub resource: String,
}

impl UriParts {
    /// Split userinfo into decoded (user, password). None when there is no userinfo.
    pub fn credentials(&self) -> Option<(String, String)> {
        if self.username.is_empty() {
            return None;
        }
        let (user, pass) = match self.username.split_once(':') {
            Some((u, p)) => (u, p),
            None => (self.username.as_str(), ""),
        };
        Some((
            percent_decode_str(user).decode_utf8_lossy().into_owned(),
            percent_decode_str(pass).decode_utf8_lossy().into_owned(),
        ))
    }

    /// True for schemes this client can fetch.
    pub fn is_http(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("http") || self.scheme.eq_ignore_ascii_case("https")
    }

    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// Absolute form `scheme://host:port/resource`, as sent to a proxy.
    pub fn absolute(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.resource)
    }
}

/// Default port for a scheme, 0 when unknown.
pub fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("http") {
        80
    } else if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        0
    }
}

/// Separate a URI into its components.
pub fn separate(uri: &str) -> UriParts {
    let mut parts = UriParts::default();

    let rest = if uri.starts_with("//") {
        parts.scheme = "http".to_string();
        uri
    } else {
        let (head, tail) = match uri.split_once(':') {
            Some(split) => split,
            None => {
                // No scheme delimiter at all: a local resource.
                parts.resource = truncate_to(uri, MAX_URI - 1).to_string();
                return parts;
            }
        };
        if head.contains('.') || head.contains('/') || tail.is_empty() {
            return separate_host_port(head, tail);
        }
        parts.scheme = head.to_string();
        tail
    };

    if !rest.starts_with("//") {
        parts.resource = truncate_to(rest, MAX_URI - 1).to_string();
        return parts;
    }

    let rest = rest.trim_start_matches('/');
    let slash = rest.find('/').unwrap_or(rest.len());
    let rest = match rest.find('@') {
        Some(at) if at < slash => {
            parts.username = truncate_to(&rest[..at], MAX_URI - 1).to_string();
            &rest[at + 1..]
        }
        _ => rest,
    };

    let host_end = rest.find([':', '/']).unwrap_or(rest.len());
    parts.host = truncate_to(&rest[..host_end], MAX_HOST - 1).to_string();
    let mut rest = &rest[host_end..];

    if let Some(after_colon) = rest.strip_prefix(':') {
        let (port, tail) = leading_number(after_colon);
        parts.port = port;
        rest = tail;
    } else {
        parts.port = default_port(&parts.scheme);
    }

    parts.resource = if rest.is_empty() {
        "/".to_string()
    } else {
        truncate_to(rest, MAX_URI - 1).to_string()
    };
    parts
}

/// `hostname[:port][/resource]` written without a scheme.
fn separate_host_port(head: &str, tail: &str) -> UriParts {
    let mut parts = UriParts {
        scheme: "http".to_string(),
        ..UriParts::default()
    };
    match head.find('/') {
        Some(slash) => {
            parts.host = truncate_to(&head[..slash], MAX_HOST - 1).to_string();
            parts.resource = truncate_to(&head[slash..], MAX_URI - 1).to_string();
        }
        None => parts.host = truncate_to(head, MAX_HOST - 1).to_string(),
    }
    if tail.starts_with(|c: char| c.is_ascii_digit()) {
        let (port, rest) = leading_number(tail);
        parts.port = port;
        if rest.starts_with('/') {
            parts.resource = truncate_to(rest, MAX_URI - 1).to_string();
        }
    } else {
        parts.port = 80;
    }
    parts
}

/// Parse leading decimal digits (strtol-style); returns (value, remainder). Overflow saturates to 0.
fn leading_number(s: &str) -> (u16, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let port = s[..end].parse::<u16>().unwrap_or(0);
    (port, &s[end..])
}

/// Percent-encode bytes `<= 0x20` or `>= 0x7F` for use as a request-target, bounded by `MAX_URI`.
pub fn encode_request_target(uri: &str) -> String {
    let encoded = percent_encode(uri.as_bytes(), REQUEST_TARGET).to_string();
    truncate_to(&encoded, MAX_URI).to_string()
}
