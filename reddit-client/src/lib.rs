pub mod api;
pub mod auth;
pub mod comments;
pub mod metrics;
pub mod rate_limiter;
pub mod retry;


pub use auth::{AuthState, RedditOAuth2Config, RedditToken, TokenManager};
pub use comments::CommentForest;

use api::{
    CommentPage, MoreChildrenResponse, RedditApiClient, RedditListing, RedditListingChild,
    RedditPostData,
};
use metrics::ApiMetrics;
use retry::{RetryConfig, RetryExecutor, RetryMetrics};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use threadmood_core::{
    AnalysisConfig, CommentNode, CoreError, ForumSource, Post, RedditApiError,
};
use tracing::{debug, info, warn};

/// Largest page Reddit serves for listings.
const MAX_PAGE_SIZE: usize = 100;

/// Listing and comment-tree options for one run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub time_filter: String,
    pub comment_sort: String,
    /// Cap on `/api/morechildren` calls per post. Zero disables expansion.
    pub max_more_expansions: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            time_filter: "all".to_string(),
            comment_sort: "confidence".to_string(),
            max_more_expansions: 32,
        }
    }
}

impl From<&AnalysisConfig> for FetchOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            time_filter: config.time_filter.clone(),
            max_more_expansions: config.max_more_expansions,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    pub api: ApiMetrics,
    pub retry: RetryMetrics,
    pub expansions: u64,
    pub failed_expansions: u64,
}

/// Read-only Reddit client authenticated with application-only OAuth2.
#[derive(Debug)]
pub struct RedditClient {
    api: RedditApiClient,
    auth: TokenManager,
    retry: RetryExecutor,
    options: FetchOptions,
    expansions: AtomicU64,
    failed_expansions: AtomicU64,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config, options: FetchOptions) -> Result<Self, CoreError> {
        Self::with_retry_config(config, options, RetryConfig::reddit())
    }

    pub fn with_retry_config(
        config: RedditOAuth2Config,
        options: FetchOptions,
        retry_config: RetryConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            api: RedditApiClient::new(&config.user_agent)?,
            auth: TokenManager::new(&config)?,
            retry: RetryExecutor::new(retry_config),
            options,
            expansions: AtomicU64::new(0),
            failed_expansions: AtomicU64::new(0),
        })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub async fn auth_state(&self) -> AuthState {
        self.auth.auth_state().await
    }

    pub async fn request_stats(&self) -> RequestStats {
        RequestStats {
            api: self.api.get_metrics().await,
            retry: self.retry.get_metrics(),
            expansions: self.expansions.load(Ordering::Relaxed),
            failed_expansions: self.failed_expansions.load(Ordering::Relaxed),
        }
    }

    /// GET with a bearer token. A rejected token is replaced once.
    async fn authed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let token = self.auth.access_token(self.api.http_client()).await?;
        match self.api.get_json(endpoint, &token, params).await {
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                warn!("Access token rejected, re-authenticating");
                self.auth.invalidate().await;
                let token = self.auth.access_token(self.api.http_client()).await?;
                self.api.get_json(endpoint, &token, params).await
            }
            other => other,
        }
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, CoreError> {
        self.retry
            .execute(operation_name, || self.authed_get(endpoint, params))
            .await
    }

    async fn expand_markers(&self, post: &Post, forest: &mut CommentForest) {
        let link_id = format!("t3_{}", post.id);
        let mut calls = 0;

        while calls < self.options.max_more_expansions {
            let Some(batch) = forest.next_expansion() else {
                break;
            };
            calls += 1;

            let params = [
                ("api_type", "json".to_string()),
                ("link_id", link_id.clone()),
                ("children", batch.children.join(",")),
                ("sort", self.options.comment_sort.clone()),
            ];
            let result: Result<MoreChildrenResponse, CoreError> = self
                .get_with_retry("morechildren", "/api/morechildren", &params)
                .await;

            match result {
                Ok(response) => {
                    self.expansions.fetch_add(1, Ordering::Relaxed);
                    forest.insert_expansion(&batch, response.into_things());
                }
                Err(e) => {
                    self.failed_expansions.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Could not expand {} comments of post {}: {}",
                        batch.children.len(),
                        post.id,
                        e
                    );
                }
            }
        }

        let remaining = forest.expandable_markers();
        if remaining > 0 {
            debug!(
                "Post {}: expansion cap reached with {} markers left",
                post.id, remaining
            );
        }
    }
}

impl ForumSource for RedditClient {
    async fn top_posts(&self, community: &str, limit: usize) -> Result<Vec<Post>, CoreError> {
        let community = community.trim().trim_start_matches("r/");
        if community.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "community name must not be empty".to_string(),
            });
        }

        let endpoint = format!("/r/{}/top", community);
        let mut posts: Vec<Post> = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page_size = (limit - posts.len()).min(MAX_PAGE_SIZE);
            let mut params = vec![
                ("t", self.options.time_filter.clone()),
                ("limit", page_size.to_string()),
            ];
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let listing: RedditListing<RedditListingChild<RedditPostData>> =
                self.get_with_retry("top_posts", &endpoint, &params).await?;

            let page_len = listing.data.children.len();
            let room = limit - posts.len();
            posts.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .take(room)
                    .map(|child| Post::from(child.data)),
            );
            debug!("Fetched {} posts from r/{} ({} total)", page_len, community, posts.len());

            after = listing.data.after;
            if page_len == 0 || after.is_none() {
                break;
            }
        }

        info!("Retrieved {} top posts from r/{}", posts.len(), community);
        Ok(posts)
    }

    async fn comments(&self, post: &Post) -> Result<Vec<CommentNode>, CoreError> {
        let endpoint = format!("/comments/{}", post.id);
        let params = [("sort", self.options.comment_sort.clone())];

        let (_, comment_listing): CommentPage =
            self.get_with_retry("comments", &endpoint, &params).await?;

        let mut forest = CommentForest::from_things(comment_listing.data.children);
        self.expand_markers(post, &mut forest).await;

        debug!("Post {} yielded {} comment nodes", post.id, forest.len());
        Ok(forest.into_nodes())
    }
}
