// src/response.rs
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::media;
use crate::parser::RawRequest;
use crate::pool::Task;
use crate::sock::Socket;
use crate::syscalls;

pub const STATUS_OK: &str = "200 OK";
pub const STATUS_BAD_REQUEST: &str = "400 Bad Request";
pub const STATUS_NOT_FOUND: &str = "404 Not Found";
pub const STATUS_NOT_IMPLEMENTED: &str = "501 Not Implemented";

/// Serve one parsed request: open the file under the document root, build the
/// full response in memory, and push it out in a single logical send.
///
/// Runs on a worker thread. Holds its own clone of the connection's socket,
/// so the response still goes out even if the event loop has already evicted
/// the connection record.
pub struct ServeTask {
    sock: Socket,
    root: Arc<PathBuf>,
    request: RawRequest,
    id: u64,
}

impl ServeTask {
    pub fn new(sock: Socket, root: Arc<PathBuf>, request: RawRequest, id: u64) -> Self {
        Self {
            sock,
            root,
            request,
            id,
        }
    }

    fn build(&self) -> (&'static str, Vec<u8>) {
        if self.request.bad {
            return (
                STATUS_BAD_REQUEST,
                render(STATUS_BAD_REQUEST, "text/plain", b"Bad Request", false),
            );
        }

        let mut parts = self.request.line.split_whitespace();
        let method = parts.next().unwrap_or("");
        let uri = parts.next().unwrap_or("");

        let head_only = match method {
            "GET" => false,
            "HEAD" => true,
            _ => {
                return (
                    STATUS_NOT_IMPLEMENTED,
                    render(
                        STATUS_NOT_IMPLEMENTED,
                        "text/plain",
                        b"Not Implemented",
                        false,
                    ),
                )
            }
        };

        // Query string plays no part in locating the file
        let path_part = uri.split('?').next().unwrap_or("");
        let file = format!("{}{}", self.root.display(), path_part);
        let media = media::lookup(path_part);

        match fs::read(&file) {
            Ok(body) => (STATUS_OK, render(STATUS_OK, media.mime, &body, head_only)),
            Err(e) => {
                debug!("open {} failed: {}", file, e);
                (
                    STATUS_NOT_FOUND,
                    render(STATUS_NOT_FOUND, "text/plain", b"Not Found", head_only),
                )
            }
        }
    }
}

impl Task for ServeTask {
    fn perform(self: Box<Self>) {
        let (status, response) = self.build();
        info!(
            "Response {}:{}: HTTP/1.1 {}",
            self.sock.raw(),
            self.id,
            status
        );
        // Abandon the write on failure; the connection expires by idle timeout
        if let Err(e) = syscalls::send_all(self.sock.raw(), &response) {
            debug!("send on {} abandoned: {}", self.sock.raw(), e);
        }
    }
}

/// Assemble the full response. Header set and order are fixed; a `HEAD`
/// response carries the real `Content-length` but no body bytes.
fn render(status: &str, mime: &str, body: &[u8], head_only: bool) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {}\r\n\
         Server: HttpServer\r\n\
         Connection: keep-alive\r\n\
         Keep-Alive: timeout=5\r\n\
         Content-type: {}\r\n\
         X-Content-Type-Options: nosniff\r\n\
         Content-length: {}\r\n\
         \r\n",
        status,
        mime,
        body.len()
    )
    .into_bytes();
    if !head_only {
        out.extend_from_slice(body);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscalls::{read_fd, socket_pair};
    use std::io;
    use std::path::Path;

    fn request(line: &str) -> RawRequest {
        RawRequest {
            line: line.to_string(),
            bad: false,
        }
    }

    fn temp_root(name: &str) -> Arc<PathBuf> {
        let dir = std::env::temp_dir().join(format!("etude-resp-{}-{}", std::process::id(), name));
        fs::create_dir_all(&dir).unwrap();
        Arc::new(dir)
    }

    fn run_task(root: &Arc<PathBuf>, req: RawRequest) -> Vec<u8> {
        let (a, b) = socket_pair();
        let task = Box::new(ServeTask::new(a, Arc::clone(root), req, 1));
        task.perform();

        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match read_fd(b.raw(), &mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => panic!("read failed: {}", e),
            }
        }
        out
    }

    fn write_file(root: &Path, name: &str, contents: &[u8]) {
        fs::write(root.join(name), contents).unwrap();
    }

    #[test]
    fn render_produces_the_exact_header_block() {
        let out = render(STATUS_OK, "text/html", b"<h1>hi</h1>", false);
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\n\
              Server: HttpServer\r\n\
              Connection: keep-alive\r\n\
              Keep-Alive: timeout=5\r\n\
              Content-type: text/html\r\n\
              X-Content-Type-Options: nosniff\r\n\
              Content-length: 11\r\n\
              \r\n\
              <h1>hi</h1>"
                .to_vec()
        );
    }

    #[test]
    fn get_serves_file_contents_with_mime() {
        let root = temp_root("get");
        write_file(&root, "index.html", b"<h1>hi</h1>");

        let out = run_task(&root, request("GET /index.html HTTP/1.1"));
        let text = String::from_utf8_lossy(&out);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-type: text/html\r\n"));
        assert!(text.contains("Content-length: 11\r\n"));
        assert!(text.ends_with("<h1>hi</h1>"));
    }

    #[test]
    fn head_matches_get_headers_with_empty_body() {
        let root = temp_root("head");
        write_file(&root, "index.html", b"<h1>hi</h1>");

        let get = run_task(&root, request("GET /index.html HTTP/1.1"));
        let head = run_task(&root, request("HEAD /index.html HTTP/1.1"));

        let header_end = get.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert_eq!(head, &get[..header_end]);
    }

    #[test]
    fn missing_file_yields_404() {
        let root = temp_root("missing");
        let out = run_task(&root, request("GET /nope HTTP/1.1"));
        let text = String::from_utf8_lossy(&out);

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-length: 9\r\n"));
        assert!(text.ends_with("Not Found"));
    }

    #[test]
    fn unsupported_method_yields_501() {
        let root = temp_root("post");
        let out = run_task(&root, request("POST / HTTP/1.1"));
        let text = String::from_utf8_lossy(&out);

        assert!(text.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
        assert!(text.contains("Content-length: 15\r\n"));
        assert!(text.ends_with("Not Implemented"));
    }

    #[test]
    fn bad_request_yields_400() {
        let root = temp_root("bad");
        let out = run_task(
            &root,
            RawRequest {
                line: "GET / HTTP/1.1".to_string(),
                bad: true,
            },
        );
        let text = String::from_utf8_lossy(&out);

        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.ends_with("Bad Request"));
    }

    #[test]
    fn query_string_is_stripped_from_the_path() {
        let root = temp_root("query");
        write_file(&root, "page.html", b"body");

        let plain = run_task(&root, request("GET /page.html HTTP/1.1"));
        let query = run_task(&root, request("GET /page.html?version=2&x=y HTTP/1.1"));
        assert_eq!(plain, query);
    }

    #[test]
    fn unknown_extension_defaults_to_text_plain() {
        let root = temp_root("plain");
        write_file(&root, "notes", b"text");

        let out = run_task(&root, request("GET /notes HTTP/1.1"));
        assert!(String::from_utf8_lossy(&out).contains("Content-type: text/plain\r\n"));
    }
}
