//! Minimal stand-in for the Elasticsearch index API

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// One request received on `/{index}/_doc`
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub index: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct FakeState {
    requests: Mutex<Vec<CapturedRequest>>,
    status: AtomicU16,
}

#[derive(Debug, Clone)]
pub struct FakeElasticsearch {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeElasticsearch {
    /// Bind an ephemeral port and serve until the test runtime shuts down
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            requests: Mutex::new(Vec::new()),
            status: AtomicU16::new(StatusCode::CREATED.as_u16()),
        });

        let app = Router::new()
            .route("/{index}/_doc", post(index_document))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake elasticsearch");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake elasticsearch");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Answer subsequent requests with `status`
    pub fn respond_with(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().clone()
    }

    /// Ids of every document received, in arrival order
    pub fn received_ids(&self) -> Vec<i64> {
        self.requests()
            .iter()
            .filter_map(|r| r.body.get("id").and_then(Value::as_i64))
            .collect()
    }
}

async fn index_document(
    State(state): State<Arc<FakeState>>,
    Path(index): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let count = {
        let mut requests = state.requests.lock();
        requests.push(CapturedRequest {
            index: index.clone(),
            authorization: header("authorization"),
            content_type: header("content-type"),
            body,
        });
        requests.len()
    };

    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        return (
            status,
            Json(json!({
                "_index": index,
                "_id": format!("fake-{count}"),
                "_version": 1,
                "result": "created",
            })),
        );
    }

    let reason = match status {
        StatusCode::BAD_REQUEST => "failed to parse field [datetime] of type [date]",
        StatusCode::UNAUTHORIZED => "missing authentication credentials",
        _ => "cluster unavailable",
    };
    (
        status,
        Json(json!({
            "error": { "type": "fake_exception", "reason": reason },
            "status": status.as_u16(),
        })),
    )
}
