//! In-process HTTP/1.1 test server and content fixtures

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Deterministic, non-repeating-per-chunk test content
pub fn generate_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i / 4096) as u8) ^ (i as u8)).collect()
}

/// How the test server behaves
#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Send `Accept-Ranges: bytes` and honour `Range`
    pub accept_ranges: bool,
    /// Leave the connection open after responding until the client closes it
    pub keep_alive: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            keep_alive: false,
        }
    }
}

/// A request as seen by the test server
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// Request line, e.g. `GET /file HTTP/1.1`
    pub request_line: String,
    /// Header lines as `(name, value)`
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Header value by exact name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Method token from the request line
    pub fn method(&self) -> &str {
        self.request_line.split(' ').next().unwrap_or_default()
    }
}

/// Running test server
pub struct TestServer {
    /// Port the server listens on
    pub port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    /// Serve `content` for every path
    pub async fn start(content: Vec<u8>, options: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test server");
        let port = listener.local_addr().expect("no local addr").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let content = Arc::new(content);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let content = Arc::clone(&content);
                let options = options.clone();
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    handle_connection(socket, &content, &options, &recorded).await;
                });
            }
        });

        Self { port, requests }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("poisoned").clone()
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    content: &[u8],
    options: &ServerOptions,
    recorded: &Mutex<Vec<RecordedRequest>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    recorded.lock().expect("poisoned").push(request.clone());

    let range = request
        .header("Range")
        .filter(|_| options.accept_ranges)
        .and_then(parse_range);

    let mut head = String::new();
    let body: &[u8] = match range {
        Some((start, end)) => {
            let end = end.min(content.len().saturating_sub(1));
            head.push_str("HTTP/1.1 206 Partial Content\r\n");
            head.push_str(&format!(
                "Content-Range: bytes {start}-{end}/{}\r\n",
                content.len()
            ));
            &content[start..=end]
        }
        None => {
            head.push_str("HTTP/1.1 200 OK\r\n");
            content
        }
    };
    if options.accept_ranges {
        head.push_str("Accept-Ranges: bytes\r\n");
    }
    let declared = if request.method() == "HEAD" {
        content.len()
    } else {
        body.len()
    };
    head.push_str(&format!("Content-Length: {declared}\r\n"));
    if !options.keep_alive {
        head.push_str("Connection: close\r\n");
    }
    head.push_str("\r\n");

    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    if request.method() != "HEAD" && socket.write_all(body).await.is_err() {
        return;
    }

    if options.keep_alive {
        // Hold the connection until the client goes away
        let mut sink = [0u8; 64];
        while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
    }
    let text = String::from_utf8_lossy(&raw);
    let mut lines = text.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Some(RecordedRequest {
        request_line,
        headers,
    })
}

fn parse_range(value: &str) -> Option<(usize, usize)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}
