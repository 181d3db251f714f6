// src/parser.rs
use crate::reader::LineReader;

/// Longest accepted request or header line, bytes.
pub const MAX_LINE: usize = 4096;
/// Cap on one request's total header bytes, request line included.
pub const MAX_HEADER_BYTES: usize = 32 * 1024;

/// A request pulled off the wire, ready to dispatch.
///
/// Only the request line carries meaning; headers are consumed so the reader
/// lands on the next message boundary, and `bad` records that the peer closed
/// mid-request or blew a size cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub line: String,
    pub bad: bool,
}

/// Pull one request off the reader, or `None` when the peer had nothing to
/// send (reader now at would-block or EOF).
pub fn next_request(reader: &mut LineReader) -> Option<RawRequest> {
    let line = reader.read_line(MAX_LINE);
    if line.is_empty() {
        return None;
    }

    let mut bad = !line.ends_with(b"\n");
    let mut total = line.len();

    // Discard headers through the empty "\r\n" line; what matters is leaving
    // the reader at the start of the next pipelined request.
    loop {
        let header = reader.read_line(MAX_LINE);
        if header == b"\r\n" {
            break;
        }
        if header.is_empty() {
            // peer closed or stalled mid-headers
            bad = true;
            break;
        }
        total += header.len();
        if !header.ends_with(b"\n") || total > MAX_HEADER_BYTES {
            bad = true;
            break;
        }
    }

    let line = String::from_utf8_lossy(&line)
        .trim_end_matches(['\r', '\n'])
        .to_string();
    Some(RawRequest { line, bad })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineReader;
    use crate::syscalls::{send_all, socket_pair};

    // The peer socket is returned so the write side stays open; dropping it
    // would turn would-block cases into EOF.
    fn reader_with(bytes: &[u8]) -> (LineReader, crate::sock::Socket) {
        let (a, b) = socket_pair();
        send_all(b.raw(), bytes).unwrap();
        (LineReader::new(a), b)
    }

    fn closed_reader_with(bytes: &[u8]) -> LineReader {
        let (a, b) = socket_pair();
        send_all(b.raw(), bytes).unwrap();
        drop(b);
        LineReader::new(a)
    }

    #[test]
    fn parses_request_line_and_consumes_headers() {
        let (mut reader, _peer) = reader_with(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let req = next_request(&mut reader).unwrap();

        assert_eq!(req.line, "GET /index.html HTTP/1.1");
        assert!(!req.bad);
        // Nothing further buffered: the next call sees would-block
        assert!(next_request(&mut reader).is_none());
        assert!(!reader.eof());
    }

    #[test]
    fn empty_stream_yields_no_request() {
        let (a, _b) = socket_pair();
        let mut reader = LineReader::new(a);
        assert!(next_request(&mut reader).is_none());
    }

    #[test]
    fn pipelined_requests_parse_back_to_back() {
        let (mut reader, _peer) = reader_with(
            b"GET /a.txt HTTP/1.1\r\nHost: x\r\n\r\nGET /b.txt HTTP/1.1\r\nHost: x\r\n\r\n",
        );

        let first = next_request(&mut reader).unwrap();
        let second = next_request(&mut reader).unwrap();

        assert_eq!(first.line, "GET /a.txt HTTP/1.1");
        assert_eq!(second.line, "GET /b.txt HTTP/1.1");
        assert!(!first.bad && !second.bad);
        assert!(next_request(&mut reader).is_none());
    }

    #[test]
    fn consumes_exactly_through_end_of_headers() {
        let (mut reader, _peer) = reader_with(b"HEAD /x HTTP/1.1\r\nA: 1\r\nB: 2\r\n\r\nGET");
        let req = next_request(&mut reader).unwrap();
        assert_eq!(req.line, "HEAD /x HTTP/1.1");

        // The cursor sits on the first byte of the next request
        assert_eq!(reader.read_line(16), b"GET");
    }

    #[test]
    fn peer_close_mid_headers_marks_request_bad() {
        let mut reader = closed_reader_with(b"GET / HTTP/1.1\r\nHost: x\r\n");
        let req = next_request(&mut reader).unwrap();
        assert_eq!(req.line, "GET / HTTP/1.1");
        assert!(req.bad);
        assert!(reader.eof());
    }

    #[test]
    fn truncated_request_line_is_bad() {
        let mut reader = closed_reader_with(b"GET /inco");
        let req = next_request(&mut reader).unwrap();
        assert_eq!(req.line, "GET /inco");
        assert!(req.bad);
    }

    #[test]
    fn oversized_header_line_is_bad() {
        let mut bytes = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
        bytes.extend(std::iter::repeat(b'a').take(MAX_LINE + 10));
        bytes.extend_from_slice(b"\r\n\r\n");

        let (mut reader, _peer) = reader_with(&bytes);
        let req = next_request(&mut reader).unwrap();
        assert!(req.bad);
    }

    #[test]
    fn oversized_header_block_is_bad() {
        let mut bytes = b"GET / HTTP/1.1\r\n".to_vec();
        for i in 0..20 {
            bytes.extend_from_slice(format!("X-{}: ", i).as_bytes());
            bytes.extend(std::iter::repeat(b'b').take(2048));
            bytes.extend_from_slice(b"\r\n");
        }
        bytes.extend_from_slice(b"\r\n");

        let (mut reader, _peer) = reader_with(&bytes);
        let req = next_request(&mut reader).unwrap();
        assert!(req.bad);
    }
}
