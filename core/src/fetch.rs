/*
 * fetch.rs
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

//! Resource fetch: GET a URI into a writer, following redirects.
//!
//! This is the caller the document compiler uses to materialize remote images and style
//! sheets: connect directly or through the configured proxy, retry while the exchange
//! fails, follow `301`/`302`/`303`, answer one Digest challenge, upgrade to TLS after a
//! `426`, then stream a `200` body.

use std::io::Write;

use crate::config::ClientConfig;
use crate::error::{HttpError, Result};
use crate::protocol::http::{Connection, EncryptionPolicy, FieldName, Status};
use crate::uri::{self, UriParts};

/// Read size while copying the body.
const COPY_CHUNK: usize = 8192;

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// URI the body was finally read from (after redirects).
    pub uri: String,
    pub status: Status,
    pub content_type: Option<String>,
    /// Body bytes written to the sink.
    pub bytes: u64,
}

/// Where a request for `parts` is sent and what request-target it uses.
fn route(parts: &UriParts, config: &ClientConfig) -> (String, u16, String) {
    match &config.proxy {
        Some(proxy) => (proxy.host.clone(), proxy.port, parts.absolute()),
        None => (parts.host.clone(), parts.port, parts.resource.clone()),
    }
}

/// Resolve a `Location` value against the URI it came from.
pub fn resolve_location(base: &UriParts, location: &str) -> UriParts {
    let location = location.trim();
    if location.starts_with('/') && !location.starts_with("//") {
        return UriParts {
            resource: location.to_string(),
            ..base.clone()
        };
    }
    let parts = uri::separate(location);
    if !parts.host.is_empty() {
        return parts;
    }
    // Relative path: replace the last segment of the base resource.
    let dir = match base.resource.rfind('/') {
        Some(slash) => &base.resource[..=slash],
        None => "/",
    };
    UriParts {
        resource: format!("{}{}", dir, location),
        ..base.clone()
    }
}

/// Send GET and poll until a final status. Failures become `Status::ERROR`.
fn exchange(conn: &mut Connection, target: &str, last_error: &mut Option<HttpError>) -> Status {
    if let Err(e) = conn.send_get(target) {
        tracing::warn!(error = %e, "request failed");
        *last_error = Some(e);
        return Status::ERROR;
    }
    loop {
        match conn.update() {
            Ok(Status::CONTINUE) => {
                if !conn.blocking() {
                    conn.wait(-1);
                }
            }
            Ok(status) => return status,
            Err(e) => {
                tracing::warn!(error = %e, "response failed");
                *last_error = Some(e);
                return Status::ERROR;
            }
        }
    }
}

fn discard_body(conn: &mut Connection) {
    if let Err(e) = conn.flush() {
        tracing::debug!(error = %e, "discarding response body failed");
    }
}

/// Fetch `uri` into `sink`.
///
/// Non-`200` final statuses are returned as `HttpError::Status`.
pub fn fetch<W: Write + ?Sized>(uri: &str, config: &ClientConfig, sink: &mut W) -> Result<FetchOutcome> {
    let mut parts = uri::separate(uri);
    if !parts.is_http() || parts.host.is_empty() {
        return Err(HttpError::InvalidUri(uri.to_string()));
    }

    let mut current = uri.to_string();
    let mut conn: Option<(Connection, String, u16)> = None;
    let mut status = Status::ERROR;
    let mut last_error = None;
    let mut digest_answered = false;

    let mut attempt = 0;
    while status == Status::ERROR && attempt < config.max_retries {
        attempt += 1;
        let (host, port, target) = route(&parts, config);
        let policy = if parts.is_https() {
            EncryptionPolicy::Always
        } else {
            config.encryption
        };

        // Reuse follows the endpoint only; the connection keeps whatever policy it ended with
        // (port 443, or Required after a 426).
        let mut c = match conn.take() {
            Some((c, h, p)) if h == host && p == port => c,
            _ => {
                tracing::info!(host = %host, port, "connecting");
                Connection::connect(&host, port, policy, config)?
            }
        };

        tracing::info!(target = %target, attempt, "getting");
        c.clear_fields();
        c.set_field(FieldName::Host, &parts.host);
        c.set_field(FieldName::UserAgent, &config.user_agent);
        c.set_field(FieldName::Connection, "Keep-Alive");
        if let Some(referer) = &config.referer {
            c.set_field(FieldName::Referer, referer);
        }
        c.set_cookie(config.cookies.as_deref());
        if let Some((user, password)) = parts.credentials() {
            c.set_credentials(&user, &password);
        }

        status = exchange(&mut c, &target, &mut last_error);

        if status.is_redirect() {
            discard_body(&mut c);
            let location = c.get_field(FieldName::Location).to_string();
            if location.is_empty() {
                return Err(HttpError::Protocol(format!(
                    "{} without Location",
                    status
                )));
            }
            let next = resolve_location(&parts, &location);
            if !next.is_http() {
                return Err(HttpError::InvalidUri(location));
            }
            tracing::info!(from = %current, to = %location, status = status.code(), "redirected");
            current = next.absolute();
            parts = next;
            status = Status::ERROR;
        } else if status == Status::UNAUTHORIZED
            && !digest_answered
            && c.has_digest_challenge()
            && parts.credentials().is_some()
        {
            discard_body(&mut c);
            tracing::info!("answering digest challenge");
            digest_answered = true;
            status = Status::ERROR;
        } else if status == Status::UPGRADE_REQUIRED
            && c.encryption() == EncryptionPolicy::Required
            && !c.is_encrypted()
        {
            // The next send reconnects and upgrades before asking again.
            discard_body(&mut c);
            tracing::info!(uri = %current, "retrying over TLS");
            status = Status::ERROR;
        }
        conn = Some((c, host, port));
    }

    let Some((mut c, _, _)) = conn else {
        return Err(last_error.unwrap_or(HttpError::TooManyRedirects));
    };
    if status == Status::ERROR {
        return Err(last_error.unwrap_or(HttpError::TooManyRedirects));
    }
    if status != Status::OK {
        tracing::warn!(uri = %current, status = status.code(), reason = status.reason(), "fetch failed");
        discard_body(&mut c);
        return Err(HttpError::Status(status));
    }

    let content_type = Some(c.get_field(FieldName::ContentType))
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let mut bytes = 0u64;
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = match c.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(HttpError::WouldBlock) => {
                c.wait(-1);
                continue;
            }
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n]).map_err(HttpError::Write)?;
        bytes += n as u64;
    }
    tracing::info!(uri = %current, bytes, "fetched");

    Ok(FetchOutcome {
        uri: current,
        status,
        content_type,
        bytes,
    })
}
