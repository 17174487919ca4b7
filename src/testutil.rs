//! Throwaway verification backend for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
    content_types: Arc<Mutex<Vec<String>>>,
    reply: Arc<String>,
    delay: Duration,
}

pub struct MockBackend {
    pub url: String,
    rec: Recorder,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.rec.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.rec.bodies.lock().unwrap().clone()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.rec.content_types.lock().unwrap().clone()
    }
}

/// Serve `reply` verbatim on every POST and record what arrived.
pub async fn spawn_backend(reply: &str) -> MockBackend {
    spawn_slow_backend(reply, Duration::ZERO).await
}

/// Like [`spawn_backend`], but each reply is held back for `delay`.
pub async fn spawn_slow_backend(reply: &str, delay: Duration) -> MockBackend {
    let rec = Recorder {
        reply: Arc::new(reply.to_owned()),
        delay,
        ..Default::default()
    };
    let app = Router::new()
        .route("/verify", post(verify))
        .with_state(rec.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    MockBackend {
        url: format!("http://{addr}/verify"),
        rec,
    }
}

async fn verify(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.hits.fetch_add(1, Ordering::SeqCst);
    rec.bodies.lock().unwrap().push(body);
    if let Some(ct) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        rec.content_types.lock().unwrap().push(ct.to_owned());
    }
    if !rec.delay.is_zero() {
        tokio::time::sleep(rec.delay).await;
    }
    (
        [(header::CONTENT_TYPE, "application/json")],
        rec.reply.to_string(),
    )
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/verify")
}
