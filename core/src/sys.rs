/*
 * sys.rs
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

//! Platform socket layer: IPv4 lookup, socket setup, connect, readiness poll.
//!
//! Every call returns `io::Result` built from the OS error code, so callers see one
//! error type whatever failed.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};

/// First IPv4 address for `host`. `localhost` falls back to 127.0.0.1 when lookup fails.
pub fn resolve_ipv4(host: &str, port: u16) -> io::Result<SocketAddrV4> {
    let lookup = (host, port).to_socket_addrs().map(|addrs| {
        addrs
            .filter_map(|a| match a {
                SocketAddr::V4(v4) => Some(v4),
                SocketAddr::V6(_) => None,
            })
            .next()
    });
    match lookup {
        Ok(Some(addr)) => Ok(addr),
        Ok(None) => {
            if host.eq_ignore_ascii_case("localhost") {
                return Ok(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
            }
            Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no IPv4 address for host",
            ))
        }
        Err(e) => {
            if host.eq_ignore_ascii_case("localhost") {
                tracing::debug!(error = %e, "localhost lookup failed, using 127.0.0.1");
                return Ok(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
            }
            Err(e)
        }
    }
}

fn set_int_option(fd: RawFd, level: libc::c_int, name: libc::c_int, value: libc::c_int) {
    let ret = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &value as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        tracing::debug!(name, error = %io::Error::last_os_error(), "setsockopt failed");
    }
}

fn sockaddr_v4(addr: SocketAddrV4) -> libc::sockaddr_in {
    let mut sa: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sa.sin_family = libc::AF_INET as libc::sa_family_t;
    sa.sin_port = addr.port().to_be();
    sa.sin_addr = libc::in_addr {
        s_addr: u32::from(*addr.ip()).to_be(),
    };
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    {
        sa.sin_len = std::mem::size_of::<libc::sockaddr_in>() as u8;
    }
    sa
}

/// Open a TCP socket (close-on-exec, `SO_REUSEADDR`, `SO_REUSEPORT`) and connect it.
pub fn connect_ipv4(addr: SocketAddrV4) -> io::Result<TcpStream> {
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe {
        libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
    }
    set_int_option(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, 1);
    set_int_option(fd, libc::SOL_SOCKET, libc::SO_REUSEPORT, 1);

    let sa = sockaddr_v4(addr);
    let ret = unsafe {
        libc::connect(
            fd,
            &sa as *const _ as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        let err = io::Error::last_os_error();
        unsafe {
            libc::close(fd);
        }
        return Err(err);
    }
    // The stream owns the descriptor from here on.
    Ok(unsafe { TcpStream::from_raw_fd(fd) })
}

/// True when a read on `stream` would not block (zero-timeout poll).
pub fn poll_readable(stream: &TcpStream) -> bool {
    wait_readable(stream, 0)
}

/// Wait up to `timeout_ms` (negative waits forever) for `stream` to become readable.
/// Hang-up and socket errors count as readable so the next read reports them.
pub fn wait_readable(stream: &TcpStream, timeout_ms: i32) -> bool {
    let mut pfd = libc::pollfd {
        fd: stream.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let n = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if n < 0 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
            continue;
        }
        return n > 0;
    }
}
