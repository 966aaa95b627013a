//! Shared utilities for integration testing.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::IntoResponse;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::util::BoxCloneSyncService;

use vhost_gateway::http::FallbackService;

/// One request observed by the recording fallback handler.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fallback handler that records everything it receives and answers
/// `200 fallback`.
pub fn recording_fallback(log: Arc<Mutex<Vec<SeenRequest>>>) -> FallbackService {
    BoxCloneSyncService::new(tower::service_fn(move |request: Request<Body>| {
        let log = log.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, 1024 * 1024)
                .await
                .unwrap_or_default();
            log.lock().unwrap().push(SeenRequest {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            });
            Ok::<_, Infallible>((StatusCode::OK, "fallback").into_response())
        }
    }))
}

/// A raw-TCP origin server that captures each request head and answers a
/// fixed body.
pub struct MockOrigin {
    pub addr: SocketAddr,
    heads: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    /// First line of every captured request, e.g. `GET /page HTTP/1.1`.
    pub fn request_lines(&self) -> Vec<String> {
        self.heads
            .lock()
            .unwrap()
            .iter()
            .filter_map(|head| head.lines().next().map(str::to_string))
            .collect()
    }

    /// Host header of every captured request.
    pub fn host_headers(&self) -> Vec<Option<String>> {
        self.header_values("host")
    }

    /// Value of the named header in every captured request.
    pub fn header_values(&self, header: &str) -> Vec<Option<String>> {
        self.heads
            .lock()
            .unwrap()
            .iter()
            .map(|head| {
                head.lines().find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case(header)
                        .then(|| value.trim().to_string())
                })
            })
            .collect()
    }
}

/// Start a capturing origin on an ephemeral port.
pub async fn start_capturing_origin(response: &'static str) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads = Arc::new(Mutex::new(Vec::new()));
    let captured = heads.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let captured = captured.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        // Requests in these tests carry no body, the head
                        // is all there is to read.
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        captured
                            .lock()
                            .unwrap()
                            .push(String::from_utf8_lossy(&buf).to_string());

                        let reply = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(reply.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockOrigin { addr, heads }
}
