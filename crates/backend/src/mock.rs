//! An in-process stand-in for the ground-station backend, bound to an
//! ephemeral port. It serves `GET /{vehicle}/stats` from configurable replies,
//! counts every request, can hold replies back, and records the JSON body of
//! every POST.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::{json, Value};
use tokio::sync::oneshot;
use warp::{http::StatusCode, path::FullPath, Filter, Reply};

use crate::BackendConfig;

#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Status(u16),
    /// 200 with a body that is not JSON
    Garbage,
}

impl MockReply {
    fn into_response(self) -> warp::reply::Response {
        match self {
            MockReply::Json(value) => warp::reply::json(&value).into_response(),
            MockReply::Status(code) => warp::reply::with_status(
                "backend error",
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            )
            .into_response(),
            MockReply::Garbage => warp::reply::html("<html>gateway</html>").into_response(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<String, MockReply>>,
    stalls: Mutex<HashMap<String, Duration>>,
    hits: Mutex<HashMap<String, usize>>,
    posts: Mutex<Vec<RecordedPost>>,
    post_status: Mutex<Option<u16>>,
}

impl MockState {
    fn hit(&self, path: &str) {
        *self.hits.lock().unwrap().entry(path.to_owned()).or_default() += 1;
    }

    async fn stats(&self, vehicle: &str) -> warp::reply::Response {
        let path = format!("/{}/stats", vehicle);
        self.hit(&path);

        let stall = self.stalls.lock().unwrap().get(&path).copied();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }

        self.replies
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or(MockReply::Status(404))
            .into_response()
    }

    fn post(&self, path: &str, body: Value) -> warp::reply::Response {
        self.hit(path);
        self.posts.lock().unwrap().push(RecordedPost {
            path: path.to_owned(),
            body,
        });

        match *self.post_status.lock().unwrap() {
            Some(code) => MockReply::Status(code).into_response(),
            None => MockReply::Json(json!({})).into_response(),
        }
    }
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Starts the server on the current tokio runtime.
    pub fn start() -> Self {
        let state = Arc::new(MockState::default());

        let stats = warp::get().and(warp::path!(String / "stats")).and_then({
            let state = state.clone();
            move |vehicle: String| {
                let state = state.clone();
                async move { Ok::<_, warp::Rejection>(state.stats(&vehicle).await) }
            }
        });

        let commands = warp::post()
            .and(warp::path::full())
            .and(warp::body::json())
            .map({
                let state = state.clone();
                move |path: FullPath, body: Value| state.post(path.as_str(), body)
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(stats.or(commands)).bind_with_graceful_shutdown(
            ([127, 0, 0, 1], 0),
            async move {
                let _ = shutdown_rx.await;
            },
        );
        tokio::spawn(server);

        MockBackend {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig::with_address(self.address())
    }

    /// Sets the reply served for `path` (e.g. `/uav/stats`) from now on.
    pub fn set_reply(&self, path: &str, reply: MockReply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(path.to_owned(), reply);
    }

    /// Holds every following request to `path` for `delay` before answering.
    pub fn stall(&self, path: &str, delay: Duration) {
        self.state
            .stalls
            .lock()
            .unwrap()
            .insert(path.to_owned(), delay);
    }

    /// Makes every following POST answer with `code`.
    pub fn reject_posts(&self, code: u16) {
        *self.state.post_status.lock().unwrap() = Some(code);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.state.posts.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A `/uav/stats` body in the shape the backend produces.
pub fn uav_stats(altitude: f64, armed: bool) -> Value {
    json!({
        "result": {
            "mode": "AUTO",
            "armed": armed,
            "status": "ACTIVE",
            "commands": [],
            "quick": {
                "altitude": altitude,
                "throttle": 55.5,
                "orientation": { "yaw": 270.125, "pitch": -3.5, "roll": 4.0 },
                "lat": 38.14469,
                "lon": -76.42799,
                "ground_speed": 41.234,
                "air_speed": 44.0,
                "battery": 24.66,
                "waypoint": [4, 312.5],
                "connection": [0.87, 1.2, 12]
            }
        }
    })
}

/// A `/ugv/stats` body in the shape the backend produces.
pub fn ugv_stats(distance: f64) -> Value {
    json!({
        "result": {
            "quick": {
                "states": ["DRIVING", "DROP ZONE", distance],
                "yaw": 90.0,
                "lat": 38.1459,
                "lon": -76.4265,
                "ground_speed": 4.5,
                "connection": [1.1, 1.9, 9]
            }
        }
    })
}
