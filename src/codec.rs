//! Minimal HTTP/1.1 message codec
//!
//! Requests are a request line, headers and a blank line; no request body is
//! ever sent. Responses are split at the first blank line into a forgiving
//! header map and a raw body. The status line is not interpreted.

use std::collections::{BTreeMap, HashMap};

use crate::types::Method;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// An immutable HTTP/1.1 request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    headers: BTreeMap<String, String>,
}

impl Request {
    /// Build a request for `resource`, always setting `Host` to `host`
    ///
    /// Any caller-supplied `Host` header (in any letter case) is replaced.
    /// The target is `/` followed by `resource` with its leading slashes
    /// removed, so `/x` and `x` both request `/x` rather than `//x`. No other
    /// rewriting or percent-encoding is applied.
    pub fn new(
        method: Method,
        resource: &str,
        mut headers: BTreeMap<String, String>,
        host: &str,
    ) -> Self {
        headers.retain(|name, _| !name.eq_ignore_ascii_case("host"));
        headers.insert("Host".to_string(), host.to_string());
        Self {
            method,
            path: format!("/{}", resource.trim_start_matches('/')),
            headers,
        }
    }

    /// `HEAD /resource`
    pub fn head(resource: &str, host: &str) -> Self {
        Self::new(Method::Head, resource, BTreeMap::new(), host)
    }

    /// `GET /resource`, with a `Range` header when `range` is given
    pub fn get(resource: &str, host: &str, range: Option<String>) -> Self {
        let mut headers = BTreeMap::new();
        if let Some(range) = range {
            headers.insert("Range".to_string(), range);
        }
        Self::new(Method::Get, resource, headers, host)
    }

    /// Request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request target, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of a header set on this request
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Serialize to wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} HTTP/1.1\r\n", self.method, self.path);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}

/// A parsed HTTP response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Response {
    /// Split `raw` at the first blank line into headers and body
    ///
    /// Without a blank line the whole input is treated as header text and the
    /// body is empty. Header lines without `": "` (including the status line)
    /// are skipped; on duplicate names the last occurrence wins.
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = match find_header_end(raw) {
            Some(end) => (&raw[..end], raw[end + HEADER_TERMINATOR.len()..].to_vec()),
            None => (raw, Vec::new()),
        };
        Self {
            headers: parse_headers(head),
            body,
        }
    }

    /// All headers, with names as received
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value by name; exact match first, then ASCII case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Decimal `Content-Length`; 0 when missing or unparseable
    pub fn content_length(&self) -> u64 {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Whether the server advertised `Accept-Ranges: bytes`
    pub fn accepts_ranges(&self) -> bool {
        self.header("Accept-Ranges")
            .is_some_and(|v| v.trim() == "bytes")
    }

    /// Response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take ownership of the body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Total byte length of a response once it is fully framed, if it can be known
///
/// Used by [`ResponseCompletion::ContentLength`](crate::config::ResponseCompletion).
/// Returns `None` while the headers are incomplete, or when a body is expected
/// but no numeric `Content-Length` was sent.
pub(crate) fn framed_len(raw: &[u8], expects_body: bool) -> Option<usize> {
    let end = find_header_end(raw)?;
    let head_len = end + HEADER_TERMINATOR.len();
    if !expects_body {
        return Some(head_len);
    }
    let headers = parse_headers(&raw[..end]);
    let body_len: usize = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.trim().parse().ok())?;
    Some(head_len + body_len)
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn parse_headers(head: &[u8]) -> HashMap<String, String> {
    let text = String::from_utf8_lossy(head);
    let mut headers = HashMap::new();
    for line in text.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_string(), value.to_string());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_request_wire_format() {
        let request = Request::head("file.bin", "127.0.0.1:8080");

        assert_eq!(
            request.to_bytes(),
            b"HEAD /file.bin HTTP/1.1\r\nHost: 127.0.0.1:8080\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn ranged_get_carries_range_and_host() {
        let request = Request::get("dir/file.bin", "10.0.0.1:80", Some("bytes=0-99".into()));
        let wire = String::from_utf8(request.to_bytes()).unwrap_or_default();

        assert!(wire.starts_with("GET /dir/file.bin HTTP/1.1\r\n"));
        assert!(wire.contains("\r\nRange: bytes=0-99\r\n"));
        assert!(wire.contains("\r\nHost: 10.0.0.1:80\r\n"));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[test]
    fn host_header_is_always_overwritten() {
        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), "evil:1".to_string());
        headers.insert("Host".to_string(), "other:2".to_string());

        let request = Request::new(Method::Get, "a", headers, "good:3");
        let wire = String::from_utf8(request.to_bytes()).unwrap_or_default();

        assert_eq!(request.header("Host"), Some("good:3"));
        assert_eq!(wire.matches("ost: ").count(), 1);
    }

    #[test]
    fn leading_slashes_are_collapsed() {
        assert_eq!(Request::head("/a/b", "h:1").path(), "/a/b");
        assert_eq!(Request::head("//a/b", "h:1").path(), "/a/b");
        assert_eq!(Request::head("a/b", "h:1").path(), "/a/b");
    }

    #[test]
    fn parse_splits_headers_and_body() {
        let response = Response::parse(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("Content-Length"), Some("5"));
        assert_eq!(response.body(), b"hello");
        assert_eq!(response.content_length(), 5);
    }

    #[test]
    fn parse_without_separator_has_empty_body() {
        let response = Response::parse(b"HTTP/1.1 200 OK\r\nAccept-Ranges: bytes\r\nX-A: 1");

        assert!(response.body().is_empty());
        assert_eq!(response.header("Accept-Ranges"), Some("bytes"));
        assert_eq!(response.header("X-A"), Some("1"));
    }

    #[test]
    fn parse_skips_malformed_lines_and_keeps_last_duplicate() {
        let response = Response::parse(
            b"HTTP/1.1 200 OK\r\ngarbage\r\nX-Dup: first\r\nNoSpace:x\r\nX-Dup: second\r\n\r\n",
        );

        assert_eq!(response.header("X-Dup"), Some("second"));
        assert_eq!(response.header("garbage"), None);
        assert_eq!(response.header("NoSpace"), None);
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn body_is_split_at_first_blank_line_only() {
        let response = Response::parse(b"HTTP/1.1 200 OK\r\n\r\nline\r\n\r\nmore");

        assert_eq!(response.body(), b"line\r\n\r\nmore");
    }

    #[test]
    fn body_keeps_non_utf8_bytes() {
        let mut raw = b"HTTP/1.1 206 Partial Content\r\nContent-Length: 3\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0xff, 0x00, 0xfe]);

        let response = Response::parse(&raw);

        assert_eq!(response.into_body(), vec![0xff, 0x00, 0xfe]);
    }

    #[test]
    fn content_length_defaults_to_zero() {
        assert_eq!(Response::parse(b"HTTP/1.1 200 OK\r\n\r\n").content_length(), 0);
        assert_eq!(
            Response::parse(b"HTTP/1.1 200 OK\r\nContent-Length: lots\r\n\r\n").content_length(),
            0
        );
    }

    #[test]
    fn accept_ranges_requires_bytes() {
        assert!(Response::parse(b"HTTP/1.1 200 OK\r\nAccept-Ranges: bytes\r\n\r\n").accepts_ranges());
        assert!(!Response::parse(b"HTTP/1.1 200 OK\r\nAccept-Ranges: none\r\n\r\n").accepts_ranges());
        assert!(!Response::parse(b"HTTP/1.1 200 OK\r\n\r\n").accepts_ranges());
    }

    #[test]
    fn header_lookup_falls_back_to_case_insensitive() {
        let response = Response::parse(b"HTTP/1.1 200 OK\r\ncontent-length: 42\r\n\r\n");

        assert_eq!(response.content_length(), 42);
    }

    #[test]
    fn framed_len_waits_for_headers_and_body() {
        assert_eq!(framed_len(b"HTTP/1.1 200 OK\r\nContent-Len", true), None);

        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel";
        assert_eq!(framed_len(raw, true), Some(raw.len() + 2));
    }

    #[test]
    fn framed_len_for_head_stops_at_headers() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\n";

        assert_eq!(framed_len(raw, false), Some(raw.len()));
    }

    #[test]
    fn framed_len_unknown_without_content_length() {
        assert_eq!(framed_len(b"HTTP/1.1 200 OK\r\n\r\nabc", true), None);
    }
}
