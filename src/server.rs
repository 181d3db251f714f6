// src/server.rs
use std::io;
use std::os::unix::io::RawFd;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::acceptor::Acceptor;
use crate::config::Config;
use crate::error::ServerResult;
use crate::parser;
use crate::poller::Poller;
use crate::pool::{Task, WorkerPool};
use crate::response::ServeTask;

/// The connection and request lifecycle engine.
///
/// One thread runs `run`: it multiplexes readiness over every connection,
/// accepts, parses, and dispatches. File reads and response writes happen on
/// the worker pool. The two sides share nothing but cloned socket handles:
/// workers never read from a socket, the event loop never writes to one.
pub struct Server {
    acceptor: Acceptor,
    poller: Poller,
    pool: WorkerPool,
    root: Arc<PathBuf>,
    next_request_id: u64,
}

impl Server {
    pub fn new(config: &Config) -> ServerResult<Self> {
        let acceptor = Acceptor::bind(&config.host, config.port)?;
        let poller = Poller::new(acceptor.fd())?;
        let pool = WorkerPool::new(config.workers.unwrap_or_else(WorkerPool::default_size));
        Ok(Self {
            acceptor,
            poller,
            pool,
            root: Arc::new(config.root.clone()),
            next_request_id: 0,
        })
    }

    /// Port actually bound; lets callers bind port 0 and discover the choice.
    pub fn local_port(&self) -> io::Result<u16> {
        self.acceptor.local_port()
    }

    /// Run until `shutdown` is set or the poller fails fatally.
    pub fn run(&mut self, shutdown: Arc<AtomicBool>) -> ServerResult<()> {
        self.pool.start()?;
        info!(
            "serving {} with {} workers",
            self.root.display(),
            self.pool.len()
        );

        while !shutdown.load(Ordering::Acquire) {
            if !self.poller.wait() {
                break;
            }

            for fd in self.poller.ready_fds() {
                if fd == self.acceptor.fd() {
                    // Edge-triggered: drain the whole kernel accept queue
                    while let Some(conn) = self.acceptor.accept(self.poller.now()) {
                        self.poller.add(conn);
                    }
                } else {
                    self.process_connection(fd);
                }
            }

            self.poller.remove_all_idle();
        }

        info!("shutting down");
        self.pool.quit();
        self.pool.wait();
        Ok(())
    }

    /// Drain every pipelined request visible on one readiness edge and
    /// dispatch each to the connection's sticky worker.
    fn process_connection(&mut self, fd: RawFd) {
        let now = self.poller.now();
        loop {
            // Unknown fd: this event lost a race with idle eviction
            let Some(conn) = self.poller.find_mut(fd) else {
                return;
            };
            conn.last_active = now;

            let request = parser::next_request(&mut conn.reader);
            let sock = conn.sock.clone();
            let worker = conn.worker;
            let eof = conn.reader.eof();

            let Some(request) = request else {
                if eof {
                    self.poller.remove(fd);
                }
                return;
            };

            let id = self.next_request_id;
            self.next_request_id += 1;
            info!("Request {}:{}: {}", fd, id, request.line);

            let task: Box<dyn Task> =
                Box::new(ServeTask::new(sock, Arc::clone(&self.root), request, id));
            match worker {
                Some(worker) => {
                    self.pool.assign_task(worker, task);
                }
                None => {
                    let worker = self.pool.submit_task(task);
                    if let Some(conn) = self.poller.find_mut(fd) {
                        conn.worker = Some(worker);
                    }
                }
            }

            // The socket stays alive through the task's clone until the
            // response is sent
            if eof {
                self.poller.remove(fd);
                return;
            }
        }
    }
}
