//! Shared test helpers: a fake remote source served by axum.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

/// What the fake source serves and what it observed.
#[derive(Default)]
pub struct FakeSource {
    pub strips: Mutex<BTreeMap<u64, String>>,
    /// IDs answered with HTTP 500.
    pub broken: Mutex<HashSet<u64>>,
    /// IDs answered with a body that is not JSON.
    pub garbage: Mutex<HashSet<u64>>,
    /// Answer the newest-item endpoint with HTTP 500.
    pub latest_broken: Mutex<bool>,
    pub delay: Mutex<Duration>,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub requests: Mutex<Vec<String>>,
    pub user_agents: Mutex<Vec<String>>,
}

impl FakeSource {
    /// A source publishing strips `1..=newest`.
    pub fn with_strips(newest: u64) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut strips = fake.strips.lock().unwrap();
            for id in 1..=newest {
                strips.insert(id, strip_json(id));
            }
        }
        Arc::new(fake)
    }

    pub fn break_id(&self, id: u64) {
        self.broken.lock().unwrap().insert(id);
    }

    pub fn garble_id(&self, id: u64) {
        self.garbage.lock().unwrap().insert(id);
    }

    pub fn set_delay(&self, d: Duration) {
        *self.delay.lock().unwrap() = d;
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn newest(&self) -> Option<String> {
        self.strips.lock().unwrap().values().next_back().cloned()
    }
}

/// The JSON document the real feed publishes for strip `id`.
pub fn strip_json(id: u64) -> String {
    let transcript = if id % 2 == 0 {
        format!("[[A stick figure thinks about {}]]", id)
    } else {
        String::new()
    };
    json!({
        "month": "1",
        "num": id,
        "link": "",
        "year": "2020",
        "news": "",
        "safe_title": format!("Strip number {}", id),
        "transcript": transcript,
        "alt": format!("Alt text for strip {}", id),
        "img": format!("https://imgs.example.com/comics/{}.png", id),
        "title": format!("Strip number {}", id),
        "day": format!("{}", (id % 28) + 1),
    })
    .to_string()
}

struct Tracked<'a>(&'a FakeSource);

impl<'a> Tracked<'a> {
    fn enter(fake: &'a FakeSource) -> Self {
        let now = fake.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        fake.peak.fetch_max(now, Ordering::SeqCst);
        Tracked(fake)
    }
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn observe(fake: &FakeSource, path: String, headers: &HeaderMap) {
    fake.requests.lock().unwrap().push(path);
    if let Some(ua) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        fake.user_agents.lock().unwrap().push(ua.to_string());
    }
    let delay = *fake.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

async fn latest(State(fake): State<Arc<FakeSource>>, headers: HeaderMap) -> Response {
    let _t = Tracked::enter(&fake);
    observe(&fake, "/info.0.json".into(), &headers).await;
    if *fake.latest_broken.lock().unwrap() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match fake.newest() {
        Some(body) => body.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn item(
    State(fake): State<Arc<FakeSource>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let _t = Tracked::enter(&fake);
    observe(&fake, format!("/{}/info.0.json", id), &headers).await;
    if fake.broken.lock().unwrap().contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if fake.garbage.lock().unwrap().contains(&id) {
        return "<html><body>oops</body></html>".into_response();
    }
    let body = fake.strips.lock().unwrap().get(&id).cloned();
    match body {
        Some(b) => b.into_response(),
        None => (StatusCode::NOT_FOUND, "<html>404 Not Found</html>").into_response(),
    }
}

/// Serve `fake` on an ephemeral port; returns the base URL.
pub async fn serve(fake: Arc<FakeSource>) -> String {
    let app = Router::new()
        .route("/info.0.json", get(latest))
        .route("/{id}/info.0.json", get(item))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{}", port)
}
