use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const WINDOW: Duration = Duration::from_secs(1);
const SWEEP_EVERY: u32 = 1024;

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
}

#[derive(Debug, Default)]
struct Buckets {
    by_client: HashMap<String, Window>,
    requests_since_sweep: u32,
}

/// Fixed-window limiter with one window per client. Proctored clients
/// report integrity events in bursts, so budgets must not be shared
/// across students.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            buckets: Arc::new(Mutex::new(Buckets::default())),
        }
    }

    fn allow(&self, client: &str) -> bool {
        let mut guard = self.buckets.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();

        guard.requests_since_sweep += 1;
        if guard.requests_since_sweep >= SWEEP_EVERY {
            guard.requests_since_sweep = 0;
            guard
                .by_client
                .retain(|_, w| now.duration_since(w.start) < WINDOW);
        }

        let window = guard.by_client.entry(client.to_string()).or_insert(Window {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Requests without an Authorization header share one anonymous bucket;
/// auth rejects them right after this layer anyway.
fn client_key(req: &Request<Body>) -> String {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string()
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow(&client_key(&req)) {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}
