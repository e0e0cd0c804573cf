/*
 * config.rs
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

//! Client configuration: proxy, user agent, retry budget, encryption default and TLS backend.
//!
//! Passed explicitly to `Connection::connect` and `fetch`; nothing here is process-wide.

use std::fmt;
use std::sync::Arc;

use crate::net::{RustlsBackend, TlsBackend};
use crate::protocol::http::EncryptionPolicy;
use crate::uri;

/// Maximum length of a request-target after percent-encoding.
pub const MAX_URI: usize = 1024;
/// Maximum length of a host name.
pub const MAX_HOST: usize = 256;
/// Capacity of the receive buffer shared by line and byte reads.
pub const MAX_BUFFER: usize = 2048;
/// Maximum stored length of a header field value (including the historical NUL slot).
pub const MAX_VALUE: usize = 256;
/// Maximum length of the cookie string sent with each request (including the NUL slot).
pub const MAX_COOKIE: usize = 1024;

/// Retry budget of the historical fetch loop.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Proxy every request is tunnelled through (absolute-URI request targets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct ClientConfig {
    pub proxy: Option<Proxy>,
    pub user_agent: String,
    /// Attempts per resource while the exchange ends in `Status::ERROR` or a redirect.
    pub max_retries: u32,
    /// Policy for plain `http` URIs; `https` always uses `EncryptionPolicy::Always`.
    pub encryption: EncryptionPolicy,
    pub blocking: bool,
    pub tls: Arc<dyn TlsBackend>,
    /// `Cookie` string sent with every fetch request, up to `MAX_COOKIE - 1` bytes.
    pub cookies: Option<String>,
    /// `Referer` sent with every fetch request.
    pub referer: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            proxy: None,
            user_agent: format!("hdhttp/{}", env!("CARGO_PKG_VERSION")),
            max_retries: DEFAULT_MAX_RETRIES,
            encryption: EncryptionPolicy::IfRequested,
            blocking: true,
            tls: Arc::new(RustlsBackend::new()),
            cookies: None,
            referer: None,
        }
    }

    /// Defaults plus `HTTP_PROXY`/`http_proxy`, `HDHTTP_USER_AGENT`, `HDHTTP_COOKIES` and
    /// `HDHTTP_REFERER` from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        let proxy = std::env::var("HTTP_PROXY")
            .or_else(|_| std::env::var("http_proxy"))
            .ok();
        if let Some(value) = proxy {
            config.proxy = parse_proxy(&value);
        }
        if let Ok(agent) = std::env::var("HDHTTP_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.user_agent = agent.trim().to_string();
            }
        }
        config.cookies = non_empty_var("HDHTTP_COOKIES");
        config.referer = non_empty_var("HDHTTP_REFERER");
        config
    }

    pub fn with_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy = Some(Proxy {
            host: host.into(),
            port,
        });
        self
    }

    pub fn with_tls(mut self, tls: Arc<dyn TlsBackend>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into()).filter(|c| !c.is_empty());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into()).filter(|r| !r.is_empty());
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("proxy", &self.proxy)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("encryption", &self.encryption)
            .field("blocking", &self.blocking)
            .field("cookies", &self.cookies)
            .field("referer", &self.referer)
            .finish_non_exhaustive()
    }
}

/// Parse a proxy setting such as `http://proxy:3128` or `proxy:3128`. Empty host yields None.
fn parse_proxy(value: &str) -> Option<Proxy> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parts = uri::separate(value);
    if parts.host.is_empty() {
        return None;
    }
    let port = if parts.port == 0 { 80 } else { parts.port };
    Some(Proxy {
        host: parts.host,
        port,
    })
}
