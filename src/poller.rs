// src/poller.rs
use std::io;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::conn::Connection;
use crate::syscalls::{epoll_event, Epoll};

/// Connections idle this long are evicted on the next tick.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_EVENTS: usize = 1024;

/// Readiness multiplexer plus the connection table.
///
/// The epoll interest set and the table agree at all times: every registered
/// descriptor has exactly one `Connection` record, except the listening
/// socket (registered, no record). The fd doubles as the epoll token.
pub struct Poller {
    epoll: Epoll,
    conns: Vec<Connection>,
    events: Vec<epoll_event>,
    ready: usize,
    now: Instant,
}

impl Poller {
    /// Create the epoll instance and register the listening descriptor.
    pub fn new(listen_fd: RawFd) -> io::Result<Self> {
        let epoll = Epoll::new()?;
        epoll.add(listen_fd, listen_fd as u64, libc::EPOLLIN)?;
        Ok(Self {
            epoll,
            conns: Vec::new(),
            events: vec![epoll_event { events: 0, u64: 0 }; MAX_EVENTS],
            ready: 0,
            now: Instant::now(),
        })
    }

    /// The single timestamp recorded at the top of the current tick. All idle
    /// bookkeeping in a tick is relative to this one reading.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Block until readiness or the next idle deadline. Returns `false` only
    /// on an unrecoverable poll failure.
    pub fn wait(&mut self) -> bool {
        let timeout = self.timeout_ms();
        match self.epoll.wait(&mut self.events, timeout) {
            Ok(n) => {
                self.ready = n;
                self.now = Instant::now();
                true
            }
            Err(e) => {
                error!("epoll wait failed: {}", e);
                false
            }
        }
    }

    /// Descriptors reported ready by the last `wait`.
    pub fn ready_fds(&self) -> Vec<RawFd> {
        self.events[..self.ready]
            .iter()
            .map(|ev| ev.u64 as RawFd)
            .collect()
    }

    /// Register a connection for readable readiness and insert it into the
    /// table. On registration failure the connection is dropped, which closes
    /// its socket once workers release their clones.
    pub fn add(&mut self, conn: Connection) -> bool {
        let fd = conn.fd();
        if self.find_mut(fd).is_some() {
            return false;
        }
        if let Err(e) = self.epoll.add(fd, fd as u64, libc::EPOLLIN) {
            error!("Socket {}: epoll registration failed: {}", fd, e);
            return false;
        }
        info!("Socket {}: Opened", fd);
        self.conns.push(conn);
        true
    }

    /// Drop a connection from the interest set and the table. The socket
    /// itself stays open while any worker task still holds a clone.
    pub fn remove(&mut self, fd: RawFd) {
        if let Some(pos) = self.conns.iter().position(|c| c.fd() == fd) {
            let _ = self.epoll.delete(fd);
            self.conns.swap_remove(pos);
            info!("Socket {}: Closed", fd);
        }
    }

    /// Linear lookup by descriptor. The table stays small (a few hundred
    /// entries at most) and every request already costs a syscall.
    pub fn find_mut(&mut self, fd: RawFd) -> Option<&mut Connection> {
        self.conns.iter_mut().find(|c| c.fd() == fd)
    }

    /// Evict every connection idle for `IDLE_TIMEOUT` or longer, judged
    /// against this tick's single timestamp.
    pub fn remove_all_idle(&mut self) {
        let now = self.now;
        let mut i = 0;
        while i < self.conns.len() {
            if now.duration_since(self.conns[i].last_active) >= IDLE_TIMEOUT {
                let fd = self.conns[i].fd();
                self.remove(fd);
            } else {
                i += 1;
            }
        }
    }

    /// Milliseconds until the earliest idle deadline, or -1 (wait forever)
    /// with an empty table. Guarantees `wait` returns no later than the next
    /// eviction is due.
    pub fn timeout_ms(&self) -> i32 {
        self.conns
            .iter()
            .map(|c| {
                let idle = self.now.duration_since(c.last_active);
                let remaining = IDLE_TIMEOUT.saturating_sub(idle);
                // round up so the deadline has passed when wait returns
                (remaining.as_millis() as i64 + 1).min(i32::MAX as i64) as i32
            })
            .min()
            .unwrap_or(-1)
    }
}
