/*
 * lib.rs
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

//! hdhttp core: the blocking HTTP/1.1 client HTMLDOC uses to fetch remote images, style
//! sheets and title pages.
//!
//! - `protocol::http::Connection`: one connection, the request/response state machine,
//!   chunked and length-delimited bodies, TLS (immediate or upgraded in place).
//! - `fetch`: GET a URI into a writer, following redirects through an optional proxy.
//! - `uri`, `codec`, `auth`: URI separation, Base64/date/MD5 codecs, Basic and Digest auth.

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod net;
pub mod protocol;
pub mod sys;
pub mod uri;

pub use config::ClientConfig;
pub use error::{HttpError, Result};
pub use fetch::{fetch, FetchOutcome};
pub use protocol::http::{Connection, EncryptionPolicy, FieldName, State, Status};
