use analysis_pipeline::{MetricsSnapshot, RunStats};
use reddit_client::RequestStats;
use std::fmt::Write;
use threadmood_core::{ResultRecord, ScoringScheme};
use tracing::info;

const SAMPLE_SIZE: usize = 5;

/// Human-readable results: distribution, accuracy and the first few records.
pub fn render_summary(
    records: &[ResultRecord],
    snapshot: &MetricsSnapshot,
    scheme: ScoringScheme,
) -> String {
    let mut out = String::new();

    if records.is_empty() {
        out.push_str("No data was retrieved from the subreddit.\n\nPossible reasons:\n");
        out.push_str("1. The subreddit name might be incorrect\n");
        out.push_str("2. The subreddit might be private or restricted\n");
        out.push_str("3. There might be no posts matching the criteria\n");
        out.push_str("4. There might be an issue with the Reddit API credentials\n");
        return out;
    }

    let dist = &snapshot.distribution;
    let _ = writeln!(out, "Analysis complete! Found {} posts.\n", snapshot.total);
    let _ = writeln!(out, "Sentiment Distribution:");
    let _ = writeln!(out, "Positive: {} ({:.1}%)", dist.positive, dist.positive_pct);
    let _ = writeln!(out, "Negative: {} ({:.1}%)", dist.negative, dist.negative_pct);
    let _ = writeln!(out, "Neutral: {} ({:.1}%)", dist.neutral, dist.neutral_pct);
    let _ = writeln!(
        out,
        "Average |{}|: {:.3}\n",
        scheme.column_name(),
        dist.average_magnitude
    );
    let _ = writeln!(out, "Label/score consistency: {:.2}%", snapshot.accuracy);
    if let Some(agreement) = &snapshot.agreement {
        let _ = writeln!(
            out,
            "Agreement with reference labels: {:.2}% ({} of {} labelled posts)",
            agreement.percent, agreement.agreeing, agreement.labelled
        );
    }

    let _ = writeln!(out, "\nSample Posts:");
    for record in records.iter().take(SAMPLE_SIZE) {
        let _ = writeln!(out, "\nTitle: {}", record.title);
        let _ = writeln!(out, "Sentiment: {}", record.sentiment.label);
        let _ = writeln!(out, "Score: {}", record.post_score);
        let _ = writeln!(
            out,
            "{} Score: {:.3}",
            capitalize(scheme.column_name()),
            record.sentiment.score
        );
        let _ = writeln!(out, "{}", "-".repeat(50));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn log_run_stats(stats: &RunStats, cancelled: bool) {
    info!(
        posts_seen = stats.posts_seen,
        pinned_skipped = stats.pinned_skipped,
        no_comment_skipped = stats.no_comment_skipped,
        failed = stats.failed,
        records = stats.records,
        cancelled,
        "run statistics"
    );
}

pub fn log_request_stats(stats: &RequestStats) {
    info!(
        requests = stats.api.total_requests,
        failed = stats.api.failed_requests,
        rate_limited = stats.api.rate_limited_requests,
        avg_response_ms = stats.api.average_response_time().as_millis() as u64,
        queue_wait_ms = stats.api.total_queue_wait.as_millis() as u64,
        retries = stats.retry.total_retries,
        expansions = stats.expansions,
        failed_expansions = stats.failed_expansions,
        "request statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadmood_core::{SentimentLabel, SentimentResult};

    fn record(title: &str, label: SentimentLabel, score: f64) -> ResultRecord {
        ResultRecord {
            title: title.to_string(),
            source_url: format!("https://www.reddit.com/r/t/comments/{}/", title),
            post_score: 42,
            comment_text: "text".to_string(),
            comment_score: 7,
            sentiment: SentimentResult { label, score },
        }
    }

    #[test]
    fn test_empty_summary_lists_reasons() {
        let summary = render_summary(&[], &MetricsSnapshot::default(), ScoringScheme::Compound);
        assert!(summary.starts_with("No data was retrieved"));
    }

    #[test]
    fn test_summary_shows_first_five() {
        let records: Vec<ResultRecord> = (0..7)
            .map(|i| record(&format!("post{}", i), SentimentLabel::Positive, 0.5))
            .collect();
        let snapshot = MetricsSnapshot::compute(&records);
        let summary = render_summary(&records, &snapshot, ScoringScheme::Compound);

        assert!(summary.contains("Found 7 posts"));
        assert!(summary.contains("Positive: 7 (100.0%)"));
        assert!(summary.contains("Compound Score: 0.500"));
        assert!(summary.contains("Title: post4"));
        assert!(!summary.contains("Title: post5"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("polarity"), "Polarity");
        assert_eq!(capitalize(""), "");
    }
}
