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

//! HTTP/1.1 client: blocking request/response state machine over TCP or TLS.
//!
//! Design:
//! - `Connection` owns the socket (or TLS session), a fixed-capacity `LineBuffer`, and a
//!   `FieldTable` of the recognized header fields.
//! - `send_*` writes the request head; `update` parses the response head; `read`/`write`
//!   move body bytes framed by `Content-Length` or chunked transfer coding.
//! - TLS from the first byte (`EncryptionPolicy::Always`) or in place after
//!   `101 Switching Protocols` (RFC 2817).

mod buffer;
mod field;
mod parser;
mod request;
mod state;
mod status;
mod transfer;

pub mod connection;

pub use buffer::{LineBuffer, LineRead};
pub use connection::Connection;
pub use field::{sub_field, FieldName, FieldTable};
pub use parser::{parse_chunk_size, parse_status_line};
pub use request::{request_head, Method};
pub use state::{AuthType, EncryptionPolicy, State, Version};
pub use status::Status;
pub use transfer::{body_framing, BodyEncoding, Remaining};
