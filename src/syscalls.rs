// src/syscalls.rs
use libc::{c_int, c_void, socklen_t};
use std::io;
use std::mem;
use std::net::SocketAddrV4;
use std::os::unix::io::RawFd;
use std::ptr;

/// How long a worker will park in poll() waiting for a stalled peer to drain
/// its receive window before the write is abandoned.
const SEND_POLL_TIMEOUT_MS: c_int = 10_000;

// ---- Socket operations ----

/// Create a non-blocking TCP listening socket bound to `addr`. IPv4 only.
pub fn create_listen_socket(addr: &SocketAddrV4) -> io::Result<c_int> {
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM | libc::SOCK_NONBLOCK, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        // SO_REUSEADDR so restarts don't trip over TIME_WAIT sockets
        let one: c_int = 1;
        if libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &one as *const _ as *const c_void,
            mem::size_of_val(&one) as socklen_t,
        ) < 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        let sin = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: addr.port().to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from_ne_bytes(addr.ip().octets()),
            },
            sin_zero: [0; 8],
        };
        if libc::bind(
            fd,
            &sin as *const _ as *const libc::sockaddr,
            mem::size_of_val(&sin) as socklen_t,
        ) < 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        if libc::listen(fd, libc::SOMAXCONN) < 0 {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        Ok(fd)
    }
}

/// Accept one pending connection; the returned fd is non-blocking.
/// `Ok(None)` means the kernel accept queue is drained.
pub fn accept_connection(listen_fd: c_int) -> io::Result<Option<c_int>> {
    unsafe {
        let fd = libc::accept4(
            listen_fd,
            ptr::null_mut(),
            ptr::null_mut(),
            libc::SOCK_NONBLOCK,
        );

        if fd < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                Ok(None)
            } else {
                Err(err)
            }
        } else {
            Ok(Some(fd))
        }
    }
}

/// Port the socket is actually bound to (useful after binding port 0).
pub fn local_port(fd: RawFd) -> io::Result<u16> {
    unsafe {
        let mut storage: libc::sockaddr_storage = mem::zeroed();
        let mut len = mem::size_of::<libc::sockaddr_storage>() as socklen_t;
        if libc::getsockname(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len) < 0 {
            return Err(io::Error::last_os_error());
        }
        match storage.ss_family as c_int {
            libc::AF_INET => {
                let sin = &*(&storage as *const _ as *const libc::sockaddr_in);
                Ok(u16::from_be(sin.sin_port))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unexpected socket family",
            )),
        }
    }
}

// ---- Epoll operations ----

pub use libc::epoll_event;

pub struct Epoll {
    fd: c_int,
}

impl Epoll {
    pub fn new() -> io::Result<Self> {
        unsafe {
            let fd = libc::epoll_create1(0);
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { fd })
        }
    }

    /// Register `fd` edge-triggered; the event loop must drain the socket
    /// until would-block after each notification.
    pub fn add(&self, fd: c_int, token: u64, interests: i32) -> io::Result<()> {
        let mut event = epoll_event {
            events: (interests | libc::EPOLLET) as u32,
            u64: token,
        };

        unsafe {
            if libc::epoll_ctl(self.fd, libc::EPOLL_CTL_ADD, fd, &mut event) < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    pub fn delete(&self, fd: c_int) -> io::Result<()> {
        unsafe {
            if libc::epoll_ctl(self.fd, libc::EPOLL_CTL_DEL, fd, ptr::null_mut()) < 0 {
                let err = io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ENOENT) {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Block up to `timeout_ms` (-1 = indefinitely). EINTR reads as an empty
    /// tick so the caller can re-check its shutdown flag.
    pub fn wait(&self, events: &mut [epoll_event], timeout_ms: i32) -> io::Result<usize> {
        unsafe {
            let res = libc::epoll_wait(
                self.fd,
                events.as_mut_ptr(),
                events.len() as c_int,
                timeout_ms,
            );

            if res < 0 {
                let err = io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EINTR) {
                    return Ok(0);
                }
                return Err(err);
            }

            Ok(res as usize)
        }
    }
}

impl Drop for Epoll {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

// ---- Non-blocking I/O ----

/// One read(2). `Ok(0)` is end-of-stream; would-block surfaces as an error
/// for the caller to interpret.
pub fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    unsafe {
        let res = libc::read(fd, buf.as_mut_ptr() as *mut c_void, buf.len());
        if res < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(res as usize)
        }
    }
}

/// Send the whole buffer with SIGPIPE suppressed. Partial writes resume after
/// parking in poll(); a hard error or a peer stalled past the poll timeout
/// abandons the rest.
pub fn send_all(fd: RawFd, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        let res = unsafe {
            libc::send(
                fd,
                buf.as_ptr() as *const c_void,
                buf.len(),
                libc::MSG_NOSIGNAL,
            )
        };

        if res < 0 {
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::WouldBlock => wait_writable(fd)?,
                io::ErrorKind::Interrupted => {}
                _ => return Err(err),
            }
            continue;
        }

        buf = &buf[res as usize..];
    }
    Ok(())
}

fn wait_writable(fd: RawFd) -> io::Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    let res = unsafe { libc::poll(&mut pfd, 1, SEND_POLL_TIMEOUT_MS) };
    if res < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(());
        }
        return Err(err);
    }
    if res == 0 {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "peer stalled"));
    }
    Ok(())
}

/// Non-blocking AF_UNIX pair for exercising socket-facing code in tests.
#[cfg(test)]
pub fn socket_pair() -> (crate::sock::Socket, crate::sock::Socket) {
    unsafe {
        let mut fds = [0 as c_int; 2];
        assert_eq!(
            libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr()),
            0
        );
        for fd in fds {
            let flags = libc::fcntl(fd, libc::F_GETFL, 0);
            assert!(flags >= 0);
            assert!(libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) >= 0);
        }
        (
            crate::sock::Socket::from_raw(fds[0]),
            crate::sock::Socket::from_raw(fds[1]),
        )
    }
}
