/*
 * transfer.rs
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

//! Body framing: chunked or length-delimited, and how much of the body is left.

use super::field::{FieldName, FieldTable};
use super::parser::parse_content_length;

/// How body bytes are framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Length,
    Chunked,
}

/// Where a chunked body read resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ChunkStep {
    /// Next line is a chunk size.
    #[default]
    Size,
    /// Inside chunk data.
    Data,
    /// CRLF after chunk data is still unread.
    DataEnd,
    /// Trailer lines after the last chunk, up to the blank line.
    Trailer,
}

/// Bytes left in the current body (or chunk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Bounded(u64),
    /// No `Content-Length`: the body ends when the peer closes.
    UntilClose,
}

impl Default for Remaining {
    fn default() -> Self {
        Remaining::Bounded(0)
    }
}

impl Remaining {
    pub fn is_zero(self) -> bool {
        self == Remaining::Bounded(0)
    }

    /// Largest read or write allowed for a buffer of `len` bytes.
    pub fn limit(self, len: usize) -> usize {
        match self {
            Remaining::Bounded(n) => usize::try_from(n).map_or(len, |n| n.min(len)),
            Remaining::UntilClose => len,
        }
    }

    /// Account for `n` transferred bytes.
    pub fn consume(&mut self, n: usize) {
        if let Remaining::Bounded(left) = self {
            *left = left.saturating_sub(n as u64);
        }
    }
}

/// Framing of the message whose fields are in `fields`.
///
/// `Transfer-Encoding: chunked` wins; otherwise `Content-Length`, or read-until-close
/// when it is absent.
pub fn body_framing(fields: &FieldTable) -> (BodyEncoding, Remaining) {
    if fields
        .get(FieldName::TransferEncoding)
        .trim()
        .eq_ignore_ascii_case("chunked")
    {
        return (BodyEncoding::Chunked, Remaining::Bounded(0));
    }
    let length = fields.get(FieldName::ContentLength);
    if length.is_empty() {
        return (BodyEncoding::Length, Remaining::UntilClose);
    }
    let n = parse_content_length(length).unwrap_or_else(|| {
        tracing::warn!(value = length, "unparseable Content-Length");
        0
    });
    (BodyEncoding::Length, Remaining::Bounded(n))
}
