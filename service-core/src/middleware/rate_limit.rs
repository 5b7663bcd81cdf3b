use crate::error::AppError;
use crate::middleware::client_ip::{client_ip, TrustedProxies};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Quota allowing `attempts` requests per `window_seconds`, replenished evenly.
pub fn quota(attempts: u32, window_seconds: u64) -> Quota {
    let burst = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_millis(window_seconds.saturating_mul(1000) / u64::from(burst.get()));

    match Quota::with_period(period) {
        Some(quota) => quota.allow_burst(burst),
        None => Quota::per_second(burst),
    }
}

/// Create a keyed rate limiter (by IP)
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    Arc::new(RateLimiter::dashmap(quota(attempts, window_seconds)))
}

/// Limiter plus the proxies allowed to name the client on its behalf.
#[derive(Clone)]
pub struct ClientRateLimit {
    pub limiter: IpRateLimiter,
    pub proxies: TrustedProxies,
}

impl ClientRateLimit {
    pub fn new(limiter: IpRateLimiter, proxies: TrustedProxies) -> Self {
        Self { limiter, proxies }
    }
}

/// Periodically drop limiter entries that have fully replenished.
pub fn spawn_limiter_pruning(limiters: Vec<IpRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            for limiter in &limiters {
                limiter.retain_recent();
                limiter.shrink_to_fit();
            }
            tracing::debug!(
                tracked = limiters.iter().map(|l| l.len()).sum::<usize>(),
                "Pruned rate limiter state"
            );
        }
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(rate_limit): State<ClientRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request, &rate_limit.proxies) {
        Some(ip) => match rate_limit.limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(client_ip = %ip, "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
