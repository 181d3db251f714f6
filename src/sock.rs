// src/sock.rs
use std::fmt;
use std::os::unix::io::RawFd;
use std::sync::Arc;

struct Fd(RawFd);

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

/// Shared ownership of a kernel file descriptor.
///
/// The event loop keeps one clone registered with epoll while a worker holds
/// another to write the response; whichever drops last closes the descriptor,
/// exactly once. Cheap to clone (one atomic increment).
#[derive(Clone)]
pub struct Socket {
    fd: Arc<Fd>,
}

impl Socket {
    /// Take ownership of `fd`. It will be closed when the last clone drops.
    pub fn from_raw(fd: RawFd) -> Self {
        Self { fd: Arc::new(Fd(fd)) }
    }

    /// The raw descriptor, for syscalls. Callers must not close it.
    pub fn raw(&self) -> RawFd {
        self.fd.0
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Socket").field(&self.fd.0).finish()
    }
}
