/*
 * mod.rs
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

//! HTTP authentication: Basic tokens and Digest (RFC 2617) primitives.
//!
//! The primitives are pure functions. `DigestContext` keeps the per-connection challenge state
//! (realm, nonce, nonce count, cached A1) between requests.

mod digest;

pub use digest::{digest_a1, digest_response, digest_response_qop, DigestContext};

use crate::codec::encode64;

/// Base64 of `user:pass`, the Basic credentials token.
pub fn basic_token(user: &str, pass: &str) -> String {
    encode64(format!("{}:{}", user, pass).as_bytes())
}

/// User name and password supplied for a connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// `Basic <token>` value for the Authorization field.
    pub fn basic_authorization(&self) -> String {
        format!("Basic {}", basic_token(&self.user, &self.password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
