use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Request counters for one run, grouped by endpoint kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub total_response_time: Duration,
    pub total_queue_wait: Duration,
    pub requests_by_kind: HashMap<String, u64>,
}

impl ApiMetrics {
    pub fn average_response_time(&self) -> Duration {
        if self.total_requests == 0 {
            Duration::ZERO
        } else {
            self.total_response_time / self.total_requests as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    /// Endpoint family, e.g. `top`, `comments`, `morechildren`.
    pub kind: String,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub queue_wait: Duration,
    pub success: bool,
    pub rate_limited: bool,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: RwLock<ApiMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, request: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        metrics.total_requests += 1;
        if request.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }
        if request.rate_limited {
            metrics.rate_limited_requests += 1;
        }
        metrics.total_response_time += request.response_time;
        metrics.total_queue_wait += request.queue_wait;
        *metrics.requests_by_kind.entry(request.kind).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }
}

/// Maps an endpoint path to the family it is counted under.
pub fn endpoint_kind(endpoint: &str) -> &'static str {
    if endpoint.starts_with("/api/morechildren") {
        "morechildren"
    } else if endpoint.starts_with("/comments/") {
        "comments"
    } else if endpoint.starts_with("/r/") {
        "listing"
    } else {
        "other"
    }
}
