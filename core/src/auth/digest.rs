/*
 * digest.rs
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

//! Digest authentication: A1/response hashes and the per-connection challenge context.

use rand::Rng;

use super::Credentials;
use crate::codec::md5_hex;
use crate::protocol::http::sub_field;

/// MD5 of `user:realm:pass` as lowercase hex.
pub fn digest_a1(user: &str, realm: &str, pass: &str) -> String {
    md5_hex(format!("{}:{}:{}", user, realm, pass).as_bytes())
}

/// Response value without `qop`: `MD5(a1 + nonce + ":" + MD5(method:resource))`.
pub fn digest_response(a1: &str, nonce: &str, method: &str, resource: &str) -> String {
    let a2 = md5_hex(format!("{}:{}", method, resource).as_bytes());
    md5_hex(format!("{}{}:{}", a1, nonce, a2).as_bytes())
}

/// Response value for `qop=auth` (RFC 2617 3.2.2.1):
/// `MD5(a1:nonce:nc:cnonce:qop:MD5(method:resource))`.
pub fn digest_response_qop(
    a1: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    qop: &str,
    method: &str,
    resource: &str,
) -> String {
    let a2 = md5_hex(format!("{}:{}", method, resource).as_bytes());
    md5_hex(format!("{}:{}:{}:{}:{}:{}", a1, nonce, nc, cnonce, qop, a2).as_bytes())
}

/// Challenge state for Digest authentication on one connection.
#[derive(Debug, Clone)]
pub struct DigestContext {
    user: String,
    realm: String,
    nonce: String,
    opaque: Option<String>,
    qop_auth: bool,
    nonce_count: u32,
    a1: String,
}

impl DigestContext {
    /// Build from a `WWW-Authenticate` value. None unless it is a Digest challenge carrying a nonce.
    pub fn from_challenge(challenge: &str, credentials: &Credentials) -> Option<Self> {
        let challenge = challenge.trim();
        let params = match challenge.get(..6) {
            Some(scheme) if scheme.eq_ignore_ascii_case("digest") => &challenge[6..],
            _ => return None,
        };
        let nonce = sub_field(params, "nonce")?;
        let realm = sub_field(params, "realm").unwrap_or_default();
        let qop_auth = sub_field(params, "qop")
            .map(|q| q.split(',').any(|v| v.trim().eq_ignore_ascii_case("auth")))
            .unwrap_or(false);
        let a1 = digest_a1(&credentials.user, &realm, &credentials.password);
        Some(Self {
            user: credentials.user.clone(),
            realm,
            nonce,
            opaque: sub_field(params, "opaque"),
            qop_auth,
            nonce_count: 0,
            a1,
        })
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn nonce_count(&self) -> u32 {
        self.nonce_count
    }

    /// Authorization value for the next request; increments the nonce count.
    pub fn authorization(&mut self, method: &str, resource: &str) -> String {
        self.nonce_count += 1;
        let mut value = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
            self.user, self.realm, self.nonce, resource
        );
        if self.qop_auth {
            let nc = format!("{:08x}", self.nonce_count);
            let cnonce = format!("{:016x}", rand::thread_rng().gen::<u64>());
            let response =
                digest_response_qop(&self.a1, &self.nonce, &nc, &cnonce, "auth", method, resource);
            value.push_str(&format!(
                ", qop=auth, nc={}, cnonce=\"{}\", response=\"{}\"",
                nc, cnonce, response
            ));
        } else {
            let response = digest_response(&self.a1, &self.nonce, method, resource);
            value.push_str(&format!(", response=\"{}\"", response));
        }
        if let Some(opaque) = &self.opaque {
            value.push_str(&format!(", opaque=\"{}\"", opaque));
        }
        value
    }
}
