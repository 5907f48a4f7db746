//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tts_relay::{RelayConfig, RelayServer, Shutdown};

pub const SECRET: &str = "s3cret";
pub const API_KEY: &str = "test-key";

/// How the mock ends its response body.
#[derive(Debug, Clone, Copy)]
pub enum Tail {
    /// Terminating zero-length chunk, then close.
    Complete,
    /// Close the socket without the terminating chunk.
    Drop,
    /// Hold the connection open without sending anything else, until the
    /// duration passes or the relay closes its side.
    Stall(Duration),
}

/// A scripted upstream response, always sent with chunked transfer encoding.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub chunks: Vec<Vec<u8>>,
    pub head_delay: Duration,
    pub chunk_delay: Duration,
    pub tail: Tail,
}

impl MockReply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            chunks: Vec::new(),
            head_delay: Duration::ZERO,
            chunk_delay: Duration::from_millis(5),
            tail: Tail::Complete,
        }
    }

    pub fn audio(chunks: Vec<Vec<u8>>) -> Self {
        Self::new(200).header("Content-Type", "audio/mpeg").chunks(chunks)
    }

    pub fn text(status: u16, content_type: &str, body: &str) -> Self {
        Self::new(status)
            .header("Content-Type", content_type)
            .chunks(vec![body.as_bytes().to_vec()])
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn chunks(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn head_delay(mut self, delay: Duration) -> Self {
        self.head_delay = delay;
        self
    }

    pub fn tail(mut self, tail: Tail) -> Self {
        self.tail = tail;
        self
    }
}

/// What the relay sent upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Stalled connections the relay hung up on.
    pub fn closed_by_relay(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream that answers every request with `reply`.
pub async fn start_mock_upstream(reply: MockReply) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let (h, c, r) = (hits.clone(), closed.clone(), requests.clone());
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let (h, c, r, reply) = (h.clone(), c.clone(), r.clone(), reply.clone());
                    tokio::spawn(async move {
                        serve_one(socket, reply, h, c, r).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream {
        addr,
        hits,
        closed,
        requests,
    }
}

async fn serve_one(
    mut socket: TcpStream,
    reply: MockReply,
    hits: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
) {
    let Some(captured) = read_request(&mut socket).await else {
        return;
    };
    hits.fetch_add(1, Ordering::SeqCst);
    requests.lock().unwrap().push(captured);

    tokio::time::sleep(reply.head_delay).await;

    let reason = StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let mut head = format!("HTTP/1.1 {} {}\r\n", reply.status, reason);
    for (name, value) in &reply.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n");
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }

    for chunk in &reply.chunks {
        if chunk.is_empty() {
            continue;
        }
        let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
        frame.extend_from_slice(chunk);
        frame.extend_from_slice(b"\r\n");
        if socket.write_all(&frame).await.is_err() {
            return;
        }
        let _ = socket.flush().await;
        tokio::time::sleep(reply.chunk_delay).await;
    }

    match reply.tail {
        Tail::Complete => {
            let _ = socket.write_all(b"0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        }
        Tail::Drop => {
            let _ = socket.shutdown().await;
        }
        Tail::Stall(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = peer_closed(&mut socket) => {
                    closed.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    }
}

/// Resolves once the peer closes the connection or it errors.
async fn peer_closed(socket: &mut TcpStream) {
    let mut buf = [0u8; 512];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut tmp).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// A relay running on an ephemeral port; shut down on drop.
pub struct TestRelay {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `upstream`, with both secrets set.
pub fn relay_config(upstream: &MockUpstream) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstream.base_url = upstream.base_url();
    config.upstream.api_key = Some(API_KEY.into());
    config.upstream.request_timeout_ms = 5_000;
    config.security.proxy_secret = Some(SECRET.into());
    config
}

pub async fn start_relay(config: RelayConfig) -> TestRelay {
    let listener = TcpListener::bind(config.listener.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = RelayServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestRelay { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// POST a synthesis request with the shared secret.
pub async fn synthesize(relay: &TestRelay, body: serde_json::Value) -> reqwest::Response {
    client()
        .post(relay.url("/eleven/tts"))
        .header("x-proxy-secret", SECRET)
        .json(&body)
        .send()
        .await
        .expect("relay unreachable")
}

/// Deterministic pseudo-audio of `len` bytes.
pub fn audio_bytes(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
