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

//! C FFI for hdhttp core. A connection is an opaque `HdHttp *` from hdhttp_connect, released
//! with hdhttp_close. Functions returning `char *` allocate (free with hdhttp_free_string).
//! All string parameters are UTF-8 NUL-terminated.
//!
//! Integer conventions follow the historical client: field numbers are indexes into the
//! field table (see hdhttp_field_number), states and statuses are their numeric codes, and
//! -1 means failure (message from hdhttp_last_error).

use libc::{c_char, c_int};
use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ptr;

use hdhttp_core::protocol::http::FieldName;
use hdhttp_core::uri::separate;
use hdhttp_core::{fetch, ClientConfig, Connection, EncryptionPolicy, HttpError, Status};

/// Opaque connection handle.
pub struct HdHttp {
    conn: Connection,
}

/// Process configuration: defaults plus proxy and user agent from the environment.
fn config() -> &'static ClientConfig {
    static CONFIG: once_cell::sync::OnceCell<ClientConfig> = once_cell::sync::OnceCell::new();
    CONFIG.get_or_init(ClientConfig::from_env)
}

fn ptr_to_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string()) }
}

fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<CString>> = std::cell::RefCell::new(None);
}

fn set_last_error(err: impl std::fmt::Display) {
    let msg = CString::new(err.to_string().replace('\0', ""))
        .unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Borrow the connection behind a handle; records an error for NULL.
unsafe fn handle<'a>(http: *mut HdHttp) -> Option<&'a mut Connection> {
    if http.is_null() {
        set_last_error("connection handle is null");
        return None;
    }
    Some(&mut (*http).conn)
}

fn field_from_number(field: c_int) -> Option<FieldName> {
    usize::try_from(field)
        .ok()
        .and_then(|i| FieldName::ALL.get(i).copied())
}

/// Map a unit result to 0 / -1.
fn status_code(result: Result<(), HttpError>) -> c_int {
    match result {
        Ok(()) => {
            clear_last_error();
            0
        }
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn hdhttp_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Install a stderr log subscriber (level from the events, no targets). Later calls are no-ops.
#[no_mangle]
pub extern "C" fn hdhttp_init_logging() {
    static LOGGING: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .try_init();
    });
}

/// Last error message from a failed call on this thread. Valid until the next failing call. Do not free.
#[no_mangle]
pub extern "C" fn hdhttp_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Free a string returned by hdhttp_get_field, hdhttp_status_string or hdhttp_separate. No-op if ptr is NULL.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

/// Connect to host:port. encryption: 0 = if requested, 1 = never, 2 = required (upgrade),
/// 3 = always. Port 443 always uses TLS. Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_connect(
    host: *const c_char,
    port: c_int,
    encryption: c_int,
) -> *mut HdHttp {
    let Some(host) = ptr_to_str(host) else {
        set_last_error("host is null or not valid UTF-8");
        return ptr::null_mut();
    };
    let Ok(port) = u16::try_from(port) else {
        set_last_error(format!("invalid port {}", port));
        return ptr::null_mut();
    };
    let Some(policy) = EncryptionPolicy::from_i32(encryption) else {
        set_last_error(format!("invalid encryption policy {}", encryption));
        return ptr::null_mut();
    };
    match Connection::connect(&host, port, policy, config()) {
        Ok(conn) => {
            clear_last_error();
            Box::into_raw(Box::new(HdHttp { conn }))
        }
        Err(e) => {
            set_last_error(&e);
            ptr::null_mut()
        }
    }
}

/// Close the connection and free the handle. No-op if http is NULL.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_close(http: *mut HdHttp) {
    if http.is_null() {
        return;
    }
    let mut holder = Box::from_raw(http);
    holder.conn.close();
}

unsafe fn send_with(
    http: *mut HdHttp,
    uri: *const c_char,
    send: fn(&mut Connection, &str) -> Result<(), HttpError>,
) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    let Some(uri) = ptr_to_str(uri) else {
        set_last_error("uri is null or not valid UTF-8");
        return -1;
    };
    status_code(send(conn, &uri))
}

/// Send a GET request. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_get(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_get)
}

/// Send a HEAD request. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_head(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_head)
}

/// Send a POST request; stream the body with hdhttp_write. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_post(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_post)
}

/// Send a PUT request; stream the body with hdhttp_write. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_put(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_put)
}

#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_options(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_options)
}

#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_delete(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_delete)
}

#[no_mangle]
pub unsafe extern "C" fn hdhttp_send_trace(http: *mut HdHttp, uri: *const c_char) -> c_int {
    send_with(http, uri, Connection::send_trace)
}

/// Poll for the response head. Returns the status code (100 while interim or not yet
/// available), or -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_update(http: *mut HdHttp) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    match conn.update() {
        Ok(status) => {
            clear_last_error();
            status.code()
        }
        Err(e) => {
            set_last_error(&e);
            Status::ERROR.code()
        }
    }
}

/// Read up to len body bytes into buffer. Returns the count, 0 at end of body, -1 on error.
/// On a non-blocking connection with no data yet it returns -1 and `hdhttp_error` reports
/// `EWOULDBLOCK`; the exchange stays usable.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_read(http: *mut HdHttp, buffer: *mut c_char, len: c_int) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    if buffer.is_null() || len < 0 {
        set_last_error("invalid read buffer");
        return -1;
    }
    let buf = std::slice::from_raw_parts_mut(buffer as *mut u8, len as usize);
    match conn.read(buf) {
        Ok(n) => n as c_int,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Write len request body bytes (one chunk when chunked; len 0 ends a chunked body).
/// Returns the count, or -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_write(http: *mut HdHttp, buffer: *const c_char, len: c_int) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    if len < 0 || (buffer.is_null() && len > 0) {
        set_last_error("invalid write buffer");
        return -1;
    }
    let data: &[u8] = if len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(buffer as *const u8, len as usize)
    };
    match conn.write(data) {
        Ok(n) => n as c_int,
        Err(e) => {
            set_last_error(&e);
            -1
        }
    }
}

/// Discard the rest of the response body. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_flush(http: *mut HdHttp) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    status_code(conn.flush())
}

/// 1 if response data can be read without blocking, else 0.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_check(http: *mut HdHttp) -> c_int {
    match handle(http) {
        Some(conn) => c_int::from(conn.check()),
        None => 0,
    }
}

/// Field number for a header name (case-insensitive), or -1 if the field is not tracked.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_field_number(name: *const c_char) -> c_int {
    ptr_to_str(name)
        .and_then(|n| FieldName::from_name(&n))
        .map_or(-1, |f| f as c_int)
}

/// Current value of a field ("" when unset). Caller frees with hdhttp_free_string. NULL for
/// an unknown field number.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_get_field(http: *mut HdHttp, field: c_int) -> *mut c_char {
    let Some(conn) = handle(http) else { return ptr::null_mut() };
    let Some(name) = field_from_number(field) else {
        set_last_error(format!("unknown field number {}", field));
        return ptr::null_mut();
    };
    to_c_string(conn.get_field(name))
}

/// Set a request field for the next send. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_set_field(http: *mut HdHttp, field: c_int, value: *const c_char) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    let Some(name) = field_from_number(field) else {
        set_last_error(format!("unknown field number {}", field));
        return -1;
    };
    let Some(value) = ptr_to_str(value) else {
        set_last_error("value is null or not valid UTF-8");
        return -1;
    };
    conn.set_field(name, &value);
    0
}

/// Cookie string sent with every following request; null or "" stops sending it.
/// Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_set_cookie(http: *mut HdHttp, cookie: *const c_char) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    if cookie.is_null() {
        conn.set_cookie(None);
        return 0;
    }
    let Some(cookie) = ptr_to_str(cookie) else {
        set_last_error("cookie is not valid UTF-8");
        return -1;
    };
    conn.set_cookie(Some(&cookie));
    0
}

/// User name and password for Basic, or Digest once the server has challenged.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_set_credentials(
    http: *mut HdHttp,
    user: *const c_char,
    password: *const c_char,
) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    let (Some(user), Some(password)) = (ptr_to_str(user), ptr_to_str(password)) else {
        set_last_error("user or password is null or not valid UTF-8");
        return -1;
    };
    conn.set_credentials(&user, &password);
    0
}

/// Last status code (-1 after an error).
#[no_mangle]
pub unsafe extern "C" fn hdhttp_status(http: *mut HdHttp) -> c_int {
    handle(http).map_or(Status::ERROR.code(), |c| c.status().code())
}

/// Current state number (0 = idle ... 12 = closed).
#[no_mangle]
pub unsafe extern "C" fn hdhttp_state(http: *mut HdHttp) -> c_int {
    handle(http).map_or(-1, |c| c.state().as_i32())
}

/// Last platform error code (0 if none).
#[no_mangle]
pub unsafe extern "C" fn hdhttp_error(http: *mut HdHttp) -> c_int {
    handle(http).map_or(libc::EINVAL, |c| c.error_code())
}

/// Change the encryption policy (same values as hdhttp_connect). Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_set_encryption(http: *mut HdHttp, encryption: c_int) -> c_int {
    let Some(conn) = handle(http) else { return -1 };
    let Some(policy) = EncryptionPolicy::from_i32(encryption) else {
        set_last_error(format!("invalid encryption policy {}", encryption));
        return -1;
    };
    status_code(conn.set_encryption(policy))
}

/// Reason phrase for a status code. Caller frees with hdhttp_free_string.
#[no_mangle]
pub extern "C" fn hdhttp_status_string(status: c_int) -> *mut c_char {
    to_c_string(Status::from(status).reason())
}

/// Separate a URI. Each non-NULL out pointer receives an allocated string (free with
/// hdhttp_free_string); out_port receives the port (0 when unknown). Returns 0, or -1 if
/// uri is NULL.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_separate(
    uri: *const c_char,
    out_scheme: *mut *mut c_char,
    out_username: *mut *mut c_char,
    out_host: *mut *mut c_char,
    out_port: *mut c_int,
    out_resource: *mut *mut c_char,
) -> c_int {
    let Some(uri) = ptr_to_str(uri) else {
        set_last_error("uri is null or not valid UTF-8");
        return -1;
    };
    let parts = separate(&uri);
    for (out, value) in [
        (out_scheme, &parts.scheme),
        (out_username, &parts.username),
        (out_host, &parts.host),
        (out_resource, &parts.resource),
    ] {
        if !out.is_null() {
            *out = to_c_string(value);
        }
    }
    if !out_port.is_null() {
        *out_port = c_int::from(parts.port);
    }
    0
}

/// Fetch uri (following redirects, via HTTP_PROXY if set) into the file at path.
/// Returns 200 on success, the final HTTP status if it was not 200, or -1 on error.
/// The file is removed unless the fetch succeeded.
#[no_mangle]
pub unsafe extern "C" fn hdhttp_fetch_to_file(uri: *const c_char, path: *const c_char) -> c_int {
    let Some(uri) = ptr_to_str(uri) else {
        set_last_error("uri is null or not valid UTF-8");
        return -1;
    };
    let Some(path) = ptr_to_str(path) else {
        set_last_error("path is null or not valid UTF-8");
        return -1;
    };
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            set_last_error(format!("{}: {}", path, e));
            return -1;
        }
    };
    tracing::debug!(uri = %uri, path = %path, "fetching to file");
    let mut sink = BufWriter::new(file);
    let result = fetch(&uri, config(), &mut sink).and_then(|outcome| {
        sink.flush().map_err(HttpError::Write)?;
        Ok(outcome)
    });
    drop(sink);
    match result {
        Ok(outcome) => {
            clear_last_error();
            outcome.status.code()
        }
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            set_last_error(&e);
            match e {
                HttpError::Status(status) => status.code(),
                _ => -1,
            }
        }
    }
}
