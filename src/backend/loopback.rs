//! A tiny HTTP/1.1 server on 127.0.0.1 for exercising the real clients.
//!
//! Each connection serves one request and then closes. Routes match on the
//! path without its query string; unknown paths get the backend's JSON 404.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub head: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct Reply {
    bytes: Vec<u8>,
    hold_open: bool,
}

pub(crate) struct LoopbackServer {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

pub(crate) fn json_response(status: u16, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
    .into_bytes()
}

pub(crate) fn text_response(status: u16, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {} Test\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
    .into_bytes()
}

/// A `multipart/x-mixed-replace` response with no length; the body ends when
/// the connection does.
pub(crate) fn mjpeg_response(boundary: &str, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary={}\r\nConnection: close\r\n\r\n",
        boundary
    )
    .into_bytes();
    for frame in frames {
        bytes.extend_from_slice(
            format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", boundary).as_bytes(),
        );
        bytes.extend_from_slice(frame);
        bytes.extend_from_slice(b"\r\n");
    }
    bytes
}

impl LoopbackServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(Mutex::new(HashMap::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn({
            let routes = routes.clone();
            let requests = requests.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    tokio::spawn(serve(socket, routes.clone(), requests.clone()));
                }
            }
        });

        Self {
            addr,
            routes,
            requests,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replies to `path` with `response` and closes the connection.
    pub fn route(&self, path: &str, response: Vec<u8>) {
        self.insert(path, response, false);
    }

    /// Replies to `path` with `response` and keeps the connection open until
    /// the client goes away.
    pub fn route_held_open(&self, path: &str, response: Vec<u8>) {
        self.insert(path, response, true);
    }

    fn insert(&self, path: &str, bytes: Vec<u8>, hold_open: bool) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply { bytes, hold_open });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for LoopbackServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut socket: TcpStream,
    routes: Arc<Mutex<HashMap<String, Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let path = request.target.split('?').next().unwrap_or_default().to_string();
    let reply = routes.lock().unwrap().get(&path).cloned().unwrap_or(Reply {
        bytes: json_response(404, r#"{"error":"Endpoint not found"}"#),
        hold_open: false,
    });
    requests.lock().unwrap().push(request);

    if socket.write_all(&reply.bytes).await.is_err() {
        return;
    }
    if reply.hold_open {
        let mut sink = [0u8; 1024];
        while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
    }
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(position) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break position;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let header = |name: &str| {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_ascii_lowercase())
        })
    };
    let content_length: Option<usize> = header("content-length").and_then(|v| v.parse().ok());
    let chunked = header("transfer-encoding").is_some_and(|v| v.contains("chunked"));

    let mut body = buffer[head_end + 4..].to_vec();
    loop {
        let complete = match content_length {
            Some(length) => body.len() >= length,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        head,
        body,
    })
}
