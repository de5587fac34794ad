use crate::metrics::{endpoint_kind, ApiMetrics, MetricsCollector, RequestMetrics};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use reqwest::header::HeaderMap;
use reqwest::{redirect, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use threadmood_core::{CoreError, Post, RawComment, RedditApiError};
use tracing::{debug, error, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<T>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub permalink: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub num_comments: u64,
}

/// A node of a comment listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentThing {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub replies: Replies,
}

/// Reddit sends `""` instead of an empty listing for comments without replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Listing(Box<RedditListing<CommentThing>>),
    Empty(String),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(String::new())
    }
}

impl Replies {
    pub fn into_children(self) -> Vec<CommentThing> {
        match self {
            Replies::Listing(listing) => listing.data.children,
            Replies::Empty(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
}

/// `GET /comments/{id}` answers with the post listing followed by the comment listing.
pub type CommentPage = (
    RedditListing<RedditListingChild<RedditPostData>>,
    RedditListing<CommentThing>,
);

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<CommentThing>,
}

impl MoreChildrenResponse {
    pub fn into_things(self) -> Vec<CommentThing> {
        self.json.data.map(|data| data.things).unwrap_or_default()
    }
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            permalink: post_data.permalink,
            score: post_data.score,
            pinned: post_data.stickied || post_data.pinned,
        }
    }
}

impl From<RedditCommentData> for RawComment {
    fn from(comment: RedditCommentData) -> Self {
        let author = comment
            .author
            .filter(|name| !name.is_empty() && name != "[deleted]");
        Self {
            id: comment.id,
            body: comment.body,
            score: comment.score,
            author,
        }
    }
}

/// Maps a non-success status to the matching API error.
pub fn status_to_error(
    status: StatusCode,
    endpoint: &str,
    retry_after: Option<u64>,
) -> RedditApiError {
    match status.as_u16() {
        429 => RedditApiError::RateLimitExceeded {
            retry_after: retry_after.unwrap_or(60),
        },
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        // Unknown communities redirect to the search page
        301 | 302 | 404 if endpoint.starts_with("/r/") => RedditApiError::SubredditNotFound {
            subreddit: community_from_endpoint(endpoint),
        },
        404 => RedditApiError::PostNotFound {
            post_id: endpoint.rsplit('/').next().unwrap_or(endpoint).to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

fn community_from_endpoint(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("/r/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    metrics: MetricsCollector,
}

impl RedditApiClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            metrics: MetricsCollector::new(),
        })
    }

    /// The underlying HTTP client, shared with the token exchange.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Rate-limited authenticated GET decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);
        let queue_wait = self.rate_limiter.acquire_permit().await;
        let start_time = Instant::now();

        debug!("Making Reddit API request: GET {}", endpoint);
        let result = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(query_params)
            .query(&[("raw_json", "1")])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", endpoint, e);
                self.record(endpoint, None, start_time, queue_wait, false).await;
                if e.is_timeout() {
                    return Err(RedditApiError::RequestTimeout.into());
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        let headers = response.headers();
        self.rate_limiter
            .observe_quota(
                header_value(headers, "x-ratelimit-remaining"),
                header_value(headers, "x-ratelimit-reset"),
            )
            .await;

        if !status.is_success() {
            let retry_after = header_value(headers, "retry-after");
            self.record(endpoint, Some(status), start_time, queue_wait, false)
                .await;
            warn!("Request failed with status: {} for {}", status, endpoint);
            return Err(status_to_error(status, endpoint, retry_after).into());
        }

        let body = response.bytes().await?;
        self.record(endpoint, Some(status), start_time, queue_wait, true)
            .await;

        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse response for {}: {}", endpoint, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse {}: {}", endpoint, e),
            })
        })
    }

    async fn record(
        &self,
        endpoint: &str,
        status: Option<StatusCode>,
        start_time: Instant,
        queue_wait: Duration,
        success: bool,
    ) {
        self.metrics
            .record_request(RequestMetrics {
                kind: endpoint_kind(endpoint).to_string(),
                status_code: status.map(|s| s.as_u16()),
                response_time: start_time.elapsed(),
                queue_wait,
                success,
                rate_limited: status == Some(StatusCode::TOO_MANY_REQUESTS),
            })
            .await;
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.get_metrics().await
    }
}
