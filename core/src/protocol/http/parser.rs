/*
 * parser.rs
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

//! HTTP/1.1 response line parsing: status line, header lines, chunk-size lines.
//!
//! Lines arrive already split by the receive buffer (terminator removed).

use super::field::FieldName;
use super::state::Version;
use super::status::Status;

/// One classified response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine<'a> {
    /// Blank line: end of the header block.
    End,
    Status { version: Version, status: Status },
    /// Recognized field.
    Field { name: FieldName, value: &'a str },
    /// Well-formed field outside the recognized set.
    Unknown { name: &'a str },
}

/// Classify a line of a response head. None when it is neither a status line nor `Name: value`.
pub fn parse_line(line: &str) -> Option<ResponseLine<'_>> {
    if line.is_empty() {
        return Some(ResponseLine::End);
    }
    if line.starts_with("HTTP/") {
        return parse_status_line(line).map(|(version, status)| ResponseLine::Status { version, status });
    }
    let colon = line.find(':')?;
    let name = &line[..colon];
    let value = line[colon + 1..].trim_start();
    match FieldName::from_name(name) {
        Some(name) => Some(ResponseLine::Field { name, value }),
        None => Some(ResponseLine::Unknown { name: name.trim() }),
    }
}

/// `HTTP/<major>.<minor> <code> [reason]`.
pub fn parse_status_line(line: &str) -> Option<(Version, Status)> {
    let rest = line.strip_prefix("HTTP/")?;
    let (major, rest) = leading_decimal(rest)?;
    let rest = rest.strip_prefix('.')?;
    let (minor, rest) = leading_decimal(rest)?;
    let (code, _) = leading_decimal(rest.trim_start())?;
    let code = i32::try_from(code).ok()?;
    let major = u32::try_from(major).ok()?;
    let minor = u32::try_from(minor).ok()?;
    Some((Version::new(major, minor), Status(code)))
}

/// Hex size at the start of a chunk-size line; extensions after `;` are ignored.
pub fn parse_chunk_size(line: &str) -> Option<u64> {
    let line = line.trim_start();
    let end = line
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(line.len());
    if end == 0 {
        return None;
    }
    u64::from_str_radix(&line[..end], 16).ok()
}

/// Decimal value of a `Content-Length` field. Leading digits only, like `atoi`.
pub fn parse_content_length(value: &str) -> Option<u64> {
    leading_decimal(value.trim_start()).map(|(n, _)| n)
}

fn leading_decimal(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}
