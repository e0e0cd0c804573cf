/*
 * base64.rs
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

//! Base64 (RFC 4648 standard alphabet) for Basic credentials.
//!
//! Decoding is lenient like the historical client: characters outside the alphabet are
//! skipped and the first `=` ends the input.

use ::base64::alphabet;
use ::base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use ::base64::engine::DecodePaddingMode;
use ::base64::Engine;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn is_alphabet(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

/// Encode bytes as padded Base64.
pub fn encode64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode Base64, ignoring whitespace and other stray characters.
pub fn decode64(encoded: &str) -> Result<Vec<u8>, ::base64::DecodeError> {
    let mut clean: Vec<u8> = encoded
        .bytes()
        .take_while(|&b| b != b'=')
        .filter(|&b| is_alphabet(b))
        .collect();
    // A lone trailing sextet carries no whole byte.
    if clean.len() % 4 == 1 {
        clean.pop();
    }
    LENIENT.decode(&clean)
}
