/*
 * field.rs
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

//! Recognized header fields and the per-connection field table.
//!
//! Only the closed set in [`FieldName`] is stored or transmitted; anything else seen on the
//! wire is dropped. Values are bounded by `MAX_VALUE`.

use crate::codec::truncate_to;
use crate::config::MAX_VALUE;

/// Header fields the client understands, in wire (and transmit) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    AcceptLanguage,
    AcceptRanges,
    Authorization,
    Connection,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentLocation,
    ContentMd5,
    ContentRange,
    ContentType,
    ContentVersion,
    Cookie,
    Date,
    Expect,
    Host,
    IfModifiedSince,
    IfUnmodifiedSince,
    KeepAlive,
    LastModified,
    Link,
    Location,
    Range,
    Referer,
    RetryAfter,
    SetCookie,
    TransferEncoding,
    Upgrade,
    UserAgent,
    WwwAuthenticate,
}

impl FieldName {
    pub const COUNT: usize = 30;

    pub const ALL: [FieldName; FieldName::COUNT] = [
        FieldName::AcceptLanguage,
        FieldName::AcceptRanges,
        FieldName::Authorization,
        FieldName::Connection,
        FieldName::ContentEncoding,
        FieldName::ContentLanguage,
        FieldName::ContentLength,
        FieldName::ContentLocation,
        FieldName::ContentMd5,
        FieldName::ContentRange,
        FieldName::ContentType,
        FieldName::ContentVersion,
        FieldName::Cookie,
        FieldName::Date,
        FieldName::Expect,
        FieldName::Host,
        FieldName::IfModifiedSince,
        FieldName::IfUnmodifiedSince,
        FieldName::KeepAlive,
        FieldName::LastModified,
        FieldName::Link,
        FieldName::Location,
        FieldName::Range,
        FieldName::Referer,
        FieldName::RetryAfter,
        FieldName::SetCookie,
        FieldName::TransferEncoding,
        FieldName::Upgrade,
        FieldName::UserAgent,
        FieldName::WwwAuthenticate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::AcceptLanguage => "Accept-Language",
            FieldName::AcceptRanges => "Accept-Ranges",
            FieldName::Authorization => "Authorization",
            FieldName::Connection => "Connection",
            FieldName::ContentEncoding => "Content-Encoding",
            FieldName::ContentLanguage => "Content-Language",
            FieldName::ContentLength => "Content-Length",
            FieldName::ContentLocation => "Content-Location",
            FieldName::ContentMd5 => "Content-MD5",
            FieldName::ContentRange => "Content-Range",
            FieldName::ContentType => "Content-Type",
            FieldName::ContentVersion => "Content-Version",
            FieldName::Cookie => "Cookie",
            FieldName::Date => "Date",
            FieldName::Expect => "Expect",
            FieldName::Host => "Host",
            FieldName::IfModifiedSince => "If-Modified-Since",
            FieldName::IfUnmodifiedSince => "If-Unmodified-Since",
            FieldName::KeepAlive => "Keep-Alive",
            FieldName::LastModified => "Last-Modified",
            FieldName::Link => "Link",
            FieldName::Location => "Location",
            FieldName::Range => "Range",
            FieldName::Referer => "Referer",
            FieldName::RetryAfter => "Retry-After",
            FieldName::SetCookie => "Set-Cookie",
            FieldName::TransferEncoding => "Transfer-Encoding",
            FieldName::Upgrade => "Upgrade",
            FieldName::UserAgent => "User-Agent",
            FieldName::WwwAuthenticate => "WWW-Authenticate",
        }
    }

    /// Case-insensitive lookup of a wire name. None for fields outside the recognized set.
    pub fn from_name(name: &str) -> Option<FieldName> {
        let name = name.trim();
        FieldName::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded value per recognized field; empty means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTable {
    values: [String; FieldName::COUNT],
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldName) -> &str {
        &self.values[field.index()]
    }

    /// Store a value, truncated to `MAX_VALUE - 1` bytes.
    pub fn set(&mut self, field: FieldName, value: &str) {
        let slot = &mut self.values[field.index()];
        slot.clear();
        slot.push_str(truncate_to(value, MAX_VALUE - 1));
    }

    pub fn is_set(&self, field: FieldName) -> bool {
        !self.values[field.index()].is_empty()
    }

    pub fn clear(&mut self) {
        for v in self.values.iter_mut() {
            v.clear();
        }
    }

    /// Clear everything, then seed `Host`.
    pub fn reset(&mut self, host: &str) {
        self.clear();
        self.set(FieldName::Host, host);
    }

    /// Non-empty fields in transmit order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        FieldName::ALL
            .iter()
            .copied()
            .zip(self.values.iter())
            .filter(|(_, v)| !v.is_empty())
            .map(|(f, v)| (f, v.as_str()))
    }

    /// Parameter `name` inside this field's value; see [`sub_field`].
    pub fn sub_field(&self, field: FieldName, name: &str) -> Option<String> {
        sub_field(self.get(field), name)
    }
}

/// Find `name=value` or `name="quoted value"` among comma/space separated parameters.
pub fn sub_field(value: &str, name: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() && bytes[i] != b',' {
            i += 1;
        }
        let key = &value[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if bytes[i] != b'=' {
            // Bare token (e.g. the auth scheme); move on.
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let found = if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            let v = &value[start..i];
            if i < bytes.len() {
                i += 1;
            }
            v
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b',' {
                i += 1;
            }
            &value[start..i]
        };
        if key.eq_ignore_ascii_case(name) {
            return Some(truncate_to(found, MAX_VALUE - 1).to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_every_field() {
        let mut table = FieldTable::new();
        for (i, f) in FieldName::ALL.iter().enumerate() {
            table.set(*f, &format!("value-{}", i));
        }
        for (i, f) in FieldName::ALL.iter().enumerate() {
            assert_eq!(table.get(*f), format!("value-{}", i));
        }
    }

    #[test]
    fn all_is_in_declaration_order() {
        for (i, f) in FieldName::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(FieldName::from_name("content-length"), Some(FieldName::ContentLength));
        assert_eq!(FieldName::from_name("WWW-AUTHENTICATE"), Some(FieldName::WwwAuthenticate));
        assert_eq!(FieldName::from_name("X-Powered-By"), None);
    }

    #[test]
    fn values_are_bounded() {
        let mut table = FieldTable::new();
        table.set(FieldName::Cookie, &"x".repeat(1000));
        assert_eq!(table.get(FieldName::Cookie).len(), MAX_VALUE - 1);
    }

    #[test]
    fn reset_seeds_host_only() {
        let mut table = FieldTable::new();
        table.set(FieldName::UserAgent, "agent");
        table.reset("example.com");
        let set: Vec<_> = table.iter().collect();
        assert_eq!(set, vec![(FieldName::Host, "example.com")]);
    }

    #[test]
    fn iter_in_transmit_order() {
        let mut table = FieldTable::new();
        table.set(FieldName::UserAgent, "a");
        table.set(FieldName::Authorization, "b");
        table.set(FieldName::Host, "c");
        let names: Vec<_> = table.iter().map(|(f, _)| f).collect();
        assert_eq!(
            names,
            vec![FieldName::Authorization, FieldName::Host, FieldName::UserAgent]
        );
    }

    #[test]
    fn sub_field_quoted_and_unquoted() {
        let v = "Digest realm=\"test realm\", nonce=abc123, qop=\"auth,auth-int\"";
        assert_eq!(sub_field(v, "realm").as_deref(), Some("test realm"));
        assert_eq!(sub_field(v, "nonce").as_deref(), Some("abc123"));
        assert_eq!(sub_field(v, "qop").as_deref(), Some("auth,auth-int"));
        assert_eq!(sub_field(v, "opaque"), None);
    }

    #[test]
    fn sub_field_with_spaces_around_equals() {
        assert_eq!(sub_field("a = 1 , b= \"2\"", "b").as_deref(), Some("2"));
    }
}
