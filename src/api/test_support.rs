//! Stub backend for tests, served by axum.
//!
//! Every request gets the same canned response; requests are recorded so
//! tests can inspect headers and bodies.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{self, header, HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

/// Pause between chunks of a streamed body.
const CHUNK_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
enum StubBody {
    Full(Vec<u8>),
    /// Sent chunk by chunk; `abort` resets the connection after the last one
    Chunked { chunks: Vec<Vec<u8>>, abort: bool },
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    status: u16,
    content_type: String,
    body: StubBody,
    delay: Option<Duration>,
}

impl StubResponse {
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body: StubBody::Full(body),
            delay: None,
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::new(status, "application/json", body.as_bytes().to_vec())
    }

    /// Chunked body that ends normally after `chunks`.
    pub fn chunked(status: u16, content_type: &str, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            body: StubBody::Chunked {
                chunks,
                abort: false,
            },
            ..Self::new(status, content_type, Vec::new())
        }
    }

    /// Chunked body whose connection is dropped after `chunks`.
    pub fn aborted(status: u16, content_type: &str, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            body: StubBody::Chunked {
                chunks,
                abort: true,
            },
            ..Self::new(status, content_type, Vec::new())
        }
    }

    /// Wait before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn into_response(self) -> Response {
        let body = match self.body {
            StubBody::Full(bytes) => Body::from(bytes),
            StubBody::Chunked { chunks, abort } => {
                let mut items: Vec<Result<Bytes, std::io::Error>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                if abort {
                    items.push(Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "stub dropped the connection",
                    )));
                }
                let paced = stream::iter(items).then(|item| async move {
                    tokio::time::sleep(CHUNK_INTERVAL).await;
                    item
                });
                Body::from_stream(paced)
            }
        };

        http::Response::builder()
            .status(StatusCode::from_u16(self.status).unwrap())
            .header(header::CONTENT_TYPE, self.content_type)
            .body(body)
            .unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

struct StubState {
    response: StubResponse,
    requests: mpsc::UnboundedSender<RecordedRequest>,
}

pub struct Stub {
    pub base_url: String,
    requests: Mutex<mpsc::UnboundedReceiver<RecordedRequest>>,
}

impl Stub {
    /// Next recorded request, in arrival order.
    pub async fn request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .await
            .recv()
            .await
            .expect("stub server stopped")
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: body.to_vec(),
    };
    let _ = state.requests.send(recorded);

    if let Some(delay) = state.response.delay {
        tokio::time::sleep(delay).await;
    }
    state.response.clone().into_response()
}

pub async fn spawn_stub(response: StubResponse) -> Stub {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(StubState {
        response,
        requests: tx,
    });
    let app = Router::new().fallback(handle).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Stub {
        base_url: format!("http://{}", addr),
        requests: Mutex::new(rx),
    }
}
