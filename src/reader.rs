// src/reader.rs
use std::io;

use crate::sock::Socket;
use crate::syscalls;

pub const BUF_SIZE: usize = 1024;

/// Buffered line-oriented reads over a non-blocking socket.
///
/// End-of-stream is sticky: once the peer has closed, every further call
/// reports nothing. A would-block read also yields nothing for this call but
/// leaves the reader usable on the next readiness edge.
pub struct LineReader {
    sock: Socket,
    buf: [u8; BUF_SIZE],
    cur: usize,
    remaining: usize,
    eof: bool,
}

impl LineReader {
    pub fn new(sock: Socket) -> Self {
        Self {
            sock,
            buf: [0; BUF_SIZE],
            cur: 0,
            remaining: 0,
            eof: false,
        }
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Next byte, or `None` when the stream is at EOF or has nothing buffered
    /// and the socket would block.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.eof {
            return None;
        }

        if self.remaining == 0 {
            match syscalls::read_fd(self.sock.raw(), &mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    return None;
                }
                Ok(n) => {
                    self.cur = 0;
                    self.remaining = n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                // Hard read errors read as no-byte too; the connection dies
                // by idle eviction rather than here.
                Err(_) => return None,
            }
        }

        let byte = self.buf[self.cur];
        self.cur += 1;
        self.remaining -= 1;
        Some(byte)
    }

    /// Accumulate bytes through the next `\n` (inclusive), stopping early at
    /// EOF, would-block, or after `limit` bytes. May return an empty line.
    pub fn read_line(&mut self, limit: usize) -> Vec<u8> {
        let mut line = Vec::new();
        while line.len() < limit {
            match self.read_byte() {
                Some(b) => {
                    line.push(b);
                    if b == b'\n' {
                        break;
                    }
                }
                None => break,
            }
        }
        line
    }
}
