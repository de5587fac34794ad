use analysis_pipeline::{
    accuracy, distribution, read_records_from_path, CancellationFlag, Distribution, Exporter,
    MetricsSnapshot, PipelineRunner,
};
use std::cell::RefCell;
use std::collections::HashMap;
use threadmood_core::{
    AppConfig, CommentNode, CoreError, ExportError, ForumSource, Post, RawComment,
    RedditApiError, SentimentLabel, SortKey,
};

/// In-memory forum keyed by post id.
#[derive(Default)]
struct MockForum {
    posts: Vec<Post>,
    comments: HashMap<String, Vec<CommentNode>>,
    failing_posts: Vec<String>,
    listing_error: bool,
    /// Cancels this flag once the given post's comments are requested.
    cancel_after: Option<(String, CancellationFlag)>,
    requested: RefCell<Vec<String>>,
}

impl MockForum {
    fn with_post(mut self, id: &str, score: i64, pinned: bool, comments: Vec<CommentNode>) -> Self {
        self.posts.push(Post {
            id: id.to_string(),
            title: format!("Post {}", id),
            permalink: format!("/r/test/comments/{}/post/", id),
            score,
            pinned,
        });
        self.comments.insert(id.to_string(), comments);
        self
    }
}

impl ForumSource for MockForum {
    async fn top_posts(&self, community: &str, limit: usize) -> Result<Vec<Post>, CoreError> {
        if self.listing_error {
            return Err(RedditApiError::SubredditNotFound {
                subreddit: community.to_string(),
            }
            .into());
        }
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    async fn comments(&self, post: &Post) -> Result<Vec<CommentNode>, CoreError> {
        self.requested.borrow_mut().push(post.id.clone());
        if let Some((id, flag)) = &self.cancel_after {
            if *id == post.id {
                flag.cancel();
            }
        }
        if self.failing_posts.contains(&post.id) {
            return Err(RedditApiError::ServerError { status_code: 503 }.into());
        }
        Ok(self.comments.get(&post.id).cloned().unwrap_or_default())
    }
}

fn comment(id: &str, body: &str, score: i64) -> CommentNode {
    CommentNode::Comment(RawComment {
        id: id.to_string(),
        body: body.to_string(),
        score,
        author: Some(format!("author_{}", id)),
    })
}

fn runner() -> PipelineRunner {
    PipelineRunner::from_config(&AppConfig::default()).unwrap()
}

fn scenario_a_comments() -> Vec<CommentNode> {
    vec![
        comment("c10", "Noted, I will check it later", 10),
        comment("c50", "What a wonderful and helpful write-up, thanks!", 50),
        comment("c5", "Where is the source for this?", 5),
    ]
}

#[tokio::test]
async fn test_scenario_a_selects_meaningful_comment() {
    let forum = MockForum::default().with_post("p1", 300, false, scenario_a_comments());

    let outcome = runner().run(&forum, "test", 10, None).await;
    assert_eq!(outcome.records.len(), 1);

    let record = &outcome.records[0];
    assert_eq!(record.comment_score, 50);
    assert_eq!(record.post_score, 300);
    assert_eq!(record.source_url, "https://www.reddit.com/r/test/comments/p1/post/");
    assert_eq!(
        record.comment_text,
        "what a wonderful and helpful write up thanks"
    );
    assert_eq!(record.sentiment.label, SentimentLabel::Positive);
}

#[tokio::test]
async fn test_scenario_b_short_comments_skip_post() {
    let forum = MockForum::default()
        .with_post("short", 100, false, vec![comment("a", "nice", 9), comment("b", "lol ok", 4)])
        .with_post("p1", 300, false, scenario_a_comments());

    let outcome = runner().run(&forum, "test", 10, None).await;
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.no_comment_skipped, 1);
    assert_eq!(outcome.stats.posts_seen, 2);
}

#[tokio::test]
async fn test_scenario_c_empty_collection() {
    let forum = MockForum::default();
    let outcome = runner().run(&forum, "test", 10, None).await;
    assert!(outcome.records.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let exporter = Exporter::from_config(&AppConfig::default());
    let result = exporter.export_to_path(&outcome.records, &path);

    assert!(matches!(result, Err(CoreError::Export(ExportError::NoRecords))));
    assert!(!path.exists());
    assert_eq!(accuracy(&outcome.records), 0.0);
    assert_eq!(distribution(&outcome.records), Distribution::default());
}

#[tokio::test]
async fn test_pinned_posts_are_skipped() {
    let forum = MockForum::default()
        .with_post("rules", 5000, true, scenario_a_comments())
        .with_post("p1", 300, false, scenario_a_comments());

    let outcome = runner().run(&forum, "test", 10, None).await;
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.pinned_skipped, 1);
    // Comments of a pinned post are never fetched
    assert_eq!(*forum.requested.borrow(), vec!["p1".to_string()]);
}

#[tokio::test]
async fn test_post_failures_do_not_abort_run() {
    let mut forum = MockForum::default()
        .with_post("broken", 900, false, Vec::new())
        .with_post("p1", 300, false, scenario_a_comments());
    forum.failing_posts.push("broken".to_string());

    let outcome = runner().run(&forum, "test", 10, None).await;
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.failed, 1);
    assert!(outcome.source_error.is_none());
}

#[tokio::test]
async fn test_listing_failure_yields_empty_outcome() {
    let forum = MockForum {
        listing_error: true,
        ..Default::default()
    };

    let outcome = runner().run(&forum, "nowhere", 10, None).await;
    assert!(outcome.records.is_empty());
    assert!(matches!(
        outcome.source_error,
        Some(CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_progress_reports_each_record() {
    let forum = MockForum::default()
        .with_post("p1", 300, false, scenario_a_comments())
        .with_post("short", 100, false, vec![comment("a", "nice", 9)])
        .with_post("p2", 200, false, scenario_a_comments());

    let seen = RefCell::new(Vec::new());
    let observer = |processed: usize| seen.borrow_mut().push(processed);
    let outcome = runner().run(&forum, "test", 10, Some(&observer)).await;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let flag = CancellationFlag::new();
    let mut forum = MockForum::default()
        .with_post("p1", 300, false, scenario_a_comments())
        .with_post("p2", 200, false, scenario_a_comments())
        .with_post("p3", 100, false, scenario_a_comments());
    forum.cancel_after = Some(("p1".to_string(), flag.clone()));

    let runner = runner().with_cancellation(flag);
    let outcome = runner.run(&forum, "test", 10, None).await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(*forum.requested.borrow(), vec!["p1".to_string()]);
}

#[tokio::test]
async fn test_limit_caps_posts() {
    let forum = MockForum::default()
        .with_post("p1", 300, false, scenario_a_comments())
        .with_post("p2", 200, false, scenario_a_comments())
        .with_post("p3", 100, false, scenario_a_comments());

    let outcome = runner().run(&forum, "test", 2, None).await;
    assert_eq!(outcome.stats.posts_seen, 2);
}

#[tokio::test]
async fn test_export_round_trip_through_file() {
    let forum = MockForum::default()
        .with_post("p1", 100, false, scenario_a_comments())
        .with_post(
            "p2",
            900,
            false,
            vec![comment("x", "This is a horrible and dangerous plan, I hate it", 12)],
        );

    let outcome = runner().run(&forum, "test", 10, None).await;
    assert_eq!(outcome.records.len(), 2);

    let mut config = AppConfig::default();
    config.export.sort_key = SortKey::PostScore;
    let exporter = Exporter::from_config(&config);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    assert_eq!(exporter.export_to_path(&outcome.records, &path).unwrap(), 2);

    let (read_back, _) = read_records_from_path(&path).unwrap();
    assert_eq!(read_back[0].title, "Post p2");
    assert_eq!(read_back[0].sentiment.label, SentimentLabel::Negative);

    let mut original = outcome.records.clone();
    original.sort_by(|a, b| b.post_score.cmp(&a.post_score));
    assert_eq!(read_back, original);

    let snapshot = MetricsSnapshot::compute(&read_back);
    assert_eq!(snapshot.accuracy, 100.0);
    assert_eq!(snapshot.distribution.positive, 1);
    assert_eq!(snapshot.distribution.negative, 1);
}
