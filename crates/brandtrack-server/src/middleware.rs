use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

const DEFAULT_MAX_REQUESTS: usize = 100;
const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);
// Expired client windows are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter, one window per client address.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for RateLimitState {
    /// 100 requests per 15 minutes per client.
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing a fixed request-per-window limit per client address.
///
/// Every response carries `ratelimit-limit` and `ratelimit-remaining` headers;
/// a client over its allowance gets `429` until its window rolls over.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);

    let remaining = {
        let mut windows = rate_limit.windows.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| w.started_at.elapsed() < rate_limit.window);
        }

        let window = windows.entry(client).or_insert_with(|| RateLimitWindow {
            started_at: Instant::now(),
            count: 0,
        });

        if window.started_at.elapsed() >= rate_limit.window {
            window.started_at = Instant::now();
            window.count = 0;
        }

        if window.count >= rate_limit.max_requests {
            let mut res = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(MiddlewareErrorBody {
                    error: MiddlewareError {
                        code: "rate_limited",
                        message: "rate limit exceeded",
                    },
                }),
            )
                .into_response();
            set_rate_limit_headers(&mut res, rate_limit.max_requests, 0);
            return res;
        }

        window.count += 1;
        rate_limit.max_requests - window.count
    };

    let mut res = next.run(req).await;
    set_rate_limit_headers(&mut res, rate_limit.max_requests, remaining);
    res
}

/// Best identifier available for the caller: the first `x-forwarded-for` hop
/// when a proxy supplied one, the socket peer address otherwise.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return forwarded.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
}

fn set_rate_limit_headers(res: &mut Response, limit: usize, remaining: usize) {
    if let Ok(val) = HeaderValue::from_str(&limit.to_string()) {
        res.headers_mut().insert("ratelimit-limit", val);
    }
    if let Ok(val) = HeaderValue::from_str(&remaining.to_string()) {
        res.headers_mut().insert("ratelimit-remaining", val);
    }
}
