use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    /// Set when the server reports an exhausted quota.
    paused_until: Option<Instant>,
}

/// Token bucket that also honours the `x-ratelimit-*` response headers.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = config.burst_allowance.max(1) as f64;
        // Refill rate must stay finite and positive
        let window = config.time_window.max(Duration::from_millis(1));
        let refill_rate = config.max_requests.max(1) as f64 / window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
                paused_until: None,
            }),
            capacity,
            refill_rate,
        }
    }

    /// Takes one token, or returns how long to wait for the next one.
    async fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if let Some(until) = state.paused_until {
            if until > now {
                return Err(until - now);
            }
            state.paused_until = None;
        }

        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - state.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    /// Waits until a request may be sent. Returns the time spent waiting.
    pub async fn acquire_permit(&self) -> Duration {
        let start_time = Instant::now();
        loop {
            match self.try_acquire().await {
                Ok(()) => break,
                Err(wait_time) => {
                    debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }
        start_time.elapsed()
    }

    /// Feeds back the server-side quota from response headers.
    pub async fn observe_quota(&self, remaining: Option<f64>, reset_secs: Option<u64>) {
        if let (Some(remaining), Some(reset)) = (remaining, reset_secs) {
            if remaining < 1.0 {
                debug!("Server quota exhausted, pausing for {}s", reset);
                let mut state = self.state.lock().await;
                state.paused_until = Some(Instant::now() + Duration::from_secs(reset));
            }
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = Instant::now().duration_since(state.last_refill);
        (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_allows_burst() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        });

        for _ in 0..5 {
            assert!(limiter.try_acquire().await.is_ok());
        }

        // Next acquisition should fail
        assert!(limiter.try_acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_bucket_refill() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 60, // 1 token per second
            time_window: Duration::from_secs(60),
            burst_allowance: 1,
        });

        assert!(limiter.try_acquire().await.is_ok());
        assert!(limiter.try_acquire().await.is_err());

        sleep(Duration::from_millis(1100)).await;

        assert!(limiter.try_acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_degenerate_config_still_yields_finite_wait() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 0,
            time_window: Duration::from_secs(60),
            burst_allowance: 1,
        });

        assert!(limiter.try_acquire().await.is_ok());
        let wait = limiter.try_acquire().await.unwrap_err();
        assert!(wait <= Duration::from_secs(60));

        let zero_window = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::ZERO,
            burst_allowance: 1,
        });
        assert!(zero_window.try_acquire().await.is_ok());
        assert!(zero_window.available_tokens().await.is_finite());
    }

    #[tokio::test]
    async fn test_exhausted_quota_pauses() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        limiter.observe_quota(Some(0.0), Some(30)).await;
        let wait = limiter.try_acquire().await.unwrap_err();
        assert!(wait > Duration::from_secs(25));

        // Plenty of quota left is not a pause
        let fresh = RateLimiter::new(RateLimitConfig::reddit_oauth());
        fresh.observe_quota(Some(500.0), Some(30)).await;
        assert!(fresh.try_acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_permit_reports_wait() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());
        let waited = limiter.acquire_permit().await;
        assert!(waited < Duration::from_secs(1));
        assert!(limiter.available_tokens().await <= 10.0);
    }
}
