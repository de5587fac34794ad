use sentiment_engine::{CommentSelector, SentimentAnalyzer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use threadmood_core::{AppConfig, CoreError, ErrorExt, ForumSource, Post, ResultRecord};
use tracing::{debug, error, info, warn};

/// Receives the running count of posts that produced a record.
pub trait ProgressObserver {
    fn on_progress(&self, processed: usize);
}

impl<F: Fn(usize)> ProgressObserver for F {
    fn on_progress(&self, processed: usize) {
        self(processed)
    }
}

/// Shared stop request, honoured between posts.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub posts_seen: usize,
    pub pinned_skipped: usize,
    pub no_comment_skipped: usize,
    pub failed: usize,
    pub records: usize,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub records: Vec<ResultRecord>,
    pub stats: RunStats,
    pub cancelled: bool,
    /// Set when the post listing itself could not be fetched.
    pub source_error: Option<CoreError>,
}

/// Drives one analysis run over a forum source, one post at a time.
#[derive(Debug)]
pub struct PipelineRunner {
    analyzer: SentimentAnalyzer,
    selector: CommentSelector,
    cancellation: CancellationFlag,
}

impl PipelineRunner {
    pub fn new(analyzer: SentimentAnalyzer, selector: CommentSelector) -> Self {
        Self {
            analyzer,
            selector,
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self::new(
            SentimentAnalyzer::from_config(&config.scoring)?,
            CommentSelector::from_config(config),
        ))
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn analyzer(&self) -> &SentimentAnalyzer {
        &self.analyzer
    }

    /// Never fails: problems are logged, counted and reflected in the outcome.
    pub async fn run<S: ForumSource>(
        &self,
        source: &S,
        community: &str,
        limit: usize,
        observer: Option<&dyn ProgressObserver>,
    ) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        let posts = match source.top_posts(community, limit).await {
            Ok(posts) => posts,
            Err(e) => {
                e.log_error();
                error!("Could not access r/{}: {}", community, e.user_friendly_message());
                outcome.source_error = Some(e);
                return outcome;
            }
        };
        info!("Analyzing {} posts from r/{}", posts.len(), community);

        for post in posts.iter().take(limit) {
            if self.cancellation.is_cancelled() {
                warn!(
                    "Run cancelled after {} posts, keeping {} records",
                    outcome.stats.posts_seen,
                    outcome.records.len()
                );
                outcome.cancelled = true;
                break;
            }

            outcome.stats.posts_seen += 1;
            if post.pinned {
                info!("Skipping pinned post: {}", post.title);
                outcome.stats.pinned_skipped += 1;
                continue;
            }

            match self.process_post(source, post).await {
                Ok(Some(record)) => {
                    debug!(
                        "Post '{}' -> {} ({})",
                        post.title, record.sentiment.label, record.sentiment.score
                    );
                    outcome.records.push(record);
                    if let Some(observer) = observer {
                        observer.on_progress(outcome.records.len());
                    }
                }
                Ok(None) => {
                    info!("No valid comments found for post: {}", post.title);
                    outcome.stats.no_comment_skipped += 1;
                }
                Err(e) => {
                    e.log_warn();
                    warn!("Skipping post '{}' after error", post.title);
                    outcome.stats.failed += 1;
                }
            }
        }

        outcome.stats.records = outcome.records.len();
        info!(
            "Run finished: {} records from {} posts ({} pinned, {} without comment, {} failed)",
            outcome.stats.records,
            outcome.stats.posts_seen,
            outcome.stats.pinned_skipped,
            outcome.stats.no_comment_skipped,
            outcome.stats.failed
        );
        outcome
    }

    async fn process_post<S: ForumSource>(
        &self,
        source: &S,
        post: &Post,
    ) -> Result<Option<ResultRecord>, CoreError> {
        let comments = source.comments(post).await?;
        let Some(selected) = self.selector.select(&comments, &self.analyzer) else {
            return Ok(None);
        };

        let sentiment = self.analyzer.analyze(&selected.normalized);
        Ok(Some(ResultRecord {
            title: post.title.clone(),
            source_url: post.source_url(),
            post_score: post.score,
            comment_text: selected.normalized,
            comment_score: selected.comment.score,
            sentiment,
        }))
    }
}
