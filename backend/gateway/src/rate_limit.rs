//! Per-client fixed-window limiter for uploads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use labelscan_config::RateLimitConfig;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug)]
struct Windows {
    // client -> (requests in window, window start)
    clients: HashMap<String, (u32, Instant)>,
    swept: Instant,
}

impl Windows {
    /// Drop windows that have expired.
    fn sweep(&mut self, now: Instant, window: Duration) {
        let before = self.clients.len();
        self.clients
            .retain(|_, (_, start)| now.duration_since(*start) <= window);
        self.swept = now;
        if self.clients.len() < before {
            debug!(dropped = before - self.clients.len(), "Pruned expired rate windows");
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<Windows>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(Windows {
                clients: HashMap::new(),
                swept: Instant::now(),
            })),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Count one request from `client`; false once it is over the limit.
    ///
    /// Expired windows of every client are swept at most once per window, so
    /// the table only holds clients seen recently.
    pub async fn check(&self, client: &str) -> bool {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        if now.duration_since(windows.swept) > self.window {
            windows.sweep(now, self.window);
        }
        let state = windows.clients.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) > self.window {
            *state = (1, now);
            return true;
        }
        state.0 += 1;
        if state.0 > self.max_requests {
            warn!(%client, limit = self.max_requests, "Upload rate limit exceeded");
            false
        } else {
            debug!(%client, count = state.0, limit = self.max_requests, "Upload rate check");
            true
        }
    }

    /// Clients currently holding a window.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limits_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
    }

    #[tokio::test]
    async fn expired_clients_are_dropped_on_check() {
        let limiter = RateLimiter::new(5, Duration::from_millis(50));
        for client in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert!(limiter.check(client).await);
        }
        assert_eq!(limiter.tracked_clients().await, 3);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check("10.0.0.9").await);
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
