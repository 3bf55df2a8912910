//! Rate limiting for password attempts.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A limiter idle this long has replenished its whole per-minute quota.
const IDLE_AFTER: Duration = Duration::from_secs(60);

struct AuthLimiter {
    limiter: IpRateLimiter,
    last_seen: Instant,
}

/// State for rate limiting.
pub struct RateLimitState {
    /// Per-IP limiters for the password endpoint.
    auth_limiters: Mutex<HashMap<String, AuthLimiter>>,
    /// Password attempts per minute.
    auth_rate_limit: u32,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(auth_rate_limit: u32) -> Self {
        Self {
            auth_limiters: Mutex::new(HashMap::new()),
            auth_rate_limit,
        }
    }

    fn limiters(&self) -> MutexGuard<'_, HashMap<String, AuthLimiter>> {
        self.auth_limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check whether a password attempt from `ip` is allowed.
    pub fn check_auth(&self, ip: &str) -> bool {
        let mut limiters = self.limiters();
        let entry = limiters.entry(ip.to_string()).or_insert_with(|| {
            let per_minute = NonZeroU32::new(self.auth_rate_limit).unwrap_or(NonZeroU32::MIN);
            AuthLimiter {
                limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        entry.limiter.check().is_ok()
    }

    /// Drop limiters whose client has been quiet long enough to have a full budget again.
    pub fn cleanup(&self) {
        self.cleanup_idle_at(Instant::now());
    }

    fn cleanup_idle_at(&self, now: Instant) {
        self.limiters()
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) < IDLE_AFTER);
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Client IP from the connection.
///
/// Forwarding headers are ignored: the server talks to LAN clients directly,
/// and trusting them would let a client pick its own limiter.
fn client_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware for the password endpoint.
pub async fn auth_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !state.check_auth(&ip) {
        tracing::warn!(ip = %ip, "Password rate limit exceeded");
        return ApiError::too_many_requests("Too many password attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
