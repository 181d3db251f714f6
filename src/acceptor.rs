// src/acceptor.rs
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::io::RawFd;
use std::time::Instant;

use tracing::warn;

use crate::conn::Connection;
use crate::error::{ServerError, ServerResult};
use crate::sock::Socket;
use crate::syscalls;

/// Owns the non-blocking listening socket.
pub struct Acceptor {
    sock: Socket,
}

impl Acceptor {
    /// Bind a dotted-quad IPv4 address, matching what the listener socket
    /// speaks.
    pub fn bind(host: &str, port: u16) -> ServerResult<Self> {
        let ip: Ipv4Addr = host
            .parse()
            .map_err(|_| ServerError::Addr(format!("{}:{}", host, port)))?;
        let fd = syscalls::create_listen_socket(&SocketAddrV4::new(ip, port))?;
        Ok(Self {
            sock: Socket::from_raw(fd),
        })
    }

    pub fn fd(&self) -> RawFd {
        self.sock.raw()
    }

    /// Port actually bound (differs from the requested one for port 0).
    pub fn local_port(&self) -> io::Result<u16> {
        syscalls::local_port(self.sock.raw())
    }

    /// Accept one connection, non-blocking, with `last_active` set to `now`.
    ///
    /// Returns `None` when the kernel queue is drained; callers loop on this
    /// per readiness edge. Accept errors other than would-block also end the
    /// drain, with a warning instead of a hot retry.
    pub fn accept(&self, now: Instant) -> Option<Connection> {
        match syscalls::accept_connection(self.sock.raw()) {
            Ok(Some(fd)) => Some(Connection::new(Socket::from_raw(fd), now)),
            Ok(None) => None,
            Err(e) => {
                warn!("accept failed: {}", e);
                None
            }
        }
    }
}
