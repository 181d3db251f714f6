// src/conn.rs
use std::os::unix::io::RawFd;
use std::time::Instant;

use crate::pool::WorkerId;
use crate::reader::LineReader;
use crate::sock::Socket;

/// One accepted client connection as seen by the event loop.
///
/// The sticky `worker` binding is set on the first dispatched request and
/// never reassigned; every later request on this connection goes to the same
/// worker so pipelined responses come out in request order.
pub struct Connection {
    pub sock: Socket,
    pub reader: LineReader,
    pub worker: Option<WorkerId>,
    pub last_active: Instant,
}

impl Connection {
    pub fn new(sock: Socket, now: Instant) -> Self {
        let reader = LineReader::new(sock.clone());
        Self {
            sock,
            reader,
            worker: None,
            last_active: now,
        }
    }

    pub fn fd(&self) -> RawFd {
        self.sock.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscalls::socket_pair;

    #[test]
    fn starts_unbound_with_given_timestamp() {
        let (a, _b) = socket_pair();
        let now = Instant::now();
        let conn = Connection::new(a, now);

        assert!(conn.worker.is_none());
        assert_eq!(conn.last_active, now);
        assert!(!conn.reader.eof());
    }

    #[test]
    fn reader_shares_the_connection_descriptor() {
        let (a, _b) = socket_pair();
        let fd = a.raw();
        let conn = Connection::new(a, Instant::now());
        assert_eq!(conn.fd(), fd);
    }
}
