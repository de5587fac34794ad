use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use threadmood_core::{
    AppConfig, LetterPolicy, MeaningfulnessMetric, ScoringScheme, SortKey,
};

#[derive(Debug, Parser)]
#[command(
    name = "threadmood",
    version,
    about = "Pick one representative comment per top post of a subreddit and score its sentiment"
)]
pub struct Cli {
    /// TOML configuration file (defaults to ./threadmood.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch top posts, select comments, score them and export a CSV
    Analyze(AnalyzeArgs),
    /// Recompute metrics over a previously exported CSV
    Summarize(SummarizeArgs),
}

fn parse_metric(value: &str) -> Result<MeaningfulnessMetric, String> {
    match value.to_ascii_lowercase().as_str() {
        "magnitude" => Ok(MeaningfulnessMetric::Magnitude),
        "subjectivity" => Ok(MeaningfulnessMetric::Subjectivity),
        other => Err(format!("unknown metric '{other}', expected magnitude or subjectivity")),
    }
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Subreddit name, with or without the r/ prefix
    pub community: Option<String>,

    /// Maximum number of top posts to fetch
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Listing window: hour, day, week, month, year or all
    #[arg(long)]
    pub time_filter: Option<String>,

    /// Minimum raw comment length in characters
    #[arg(long)]
    pub min_comment_length: Option<usize>,

    /// Scoring scheme: compound or polarity
    #[arg(long)]
    pub scheme: Option<ScoringScheme>,

    /// Symmetric classification threshold
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Meaningfulness metric: magnitude or subjectivity
    #[arg(long, value_parser = parse_metric)]
    pub metric: Option<MeaningfulnessMetric>,

    /// Minimum word count after normalization
    #[arg(long)]
    pub min_words: Option<usize>,

    /// Minimum absolute score for the magnitude metric
    #[arg(long)]
    pub min_score: Option<f64>,

    #[arg(long)]
    pub remove_stopwords: bool,

    #[arg(long)]
    pub keep_numbers: bool,

    #[arg(long)]
    pub keep_emojis: bool,

    /// Treat any Unicode letter as a letter instead of ASCII only
    #[arg(long)]
    pub unicode_letters: bool,

    /// Output CSV path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export order: comment_score or post_score
    #[arg(long)]
    pub sort_key: Option<SortKey>,

    /// Decimal places for the score column
    #[arg(long)]
    pub precision: Option<usize>,

    /// Reference labels (url,label) to measure agreement against
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl AnalyzeArgs {
    /// Flags win over the configuration file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(community) = &self.community {
            config.analysis.community = Some(community.clone());
        }
        if let Some(limit) = self.limit {
            config.analysis.limit = limit;
        }
        if let Some(time_filter) = &self.time_filter {
            config.analysis.time_filter = time_filter.clone();
        }
        if let Some(min_len) = self.min_comment_length {
            config.analysis.min_comment_length = min_len;
        }

        if let Some(scheme) = self.scheme {
            config.scoring.scheme = scheme;
        }
        if let Some(threshold) = self.threshold {
            config.scoring.positive_threshold = Some(threshold.abs());
            config.scoring.negative_threshold = Some(-threshold.abs());
        }

        if let Some(metric) = self.metric {
            config.meaningfulness.metric = metric;
        }
        if let Some(min_words) = self.min_words {
            config.meaningfulness.min_words = min_words;
        }
        if let Some(min_score) = self.min_score {
            config.meaningfulness.min_abs_score = min_score;
        }

        let normalization = &mut config.normalization;
        normalization.remove_stopwords |= self.remove_stopwords;
        if self.keep_numbers {
            normalization.remove_numbers = false;
        }
        if self.keep_emojis {
            normalization.remove_emojis = false;
        }
        if self.unicode_letters {
            normalization.letters = LetterPolicy::Unicode;
        }

        if let Some(output) = &self.output {
            config.export.path = output.display().to_string();
        }
        if let Some(sort_key) = self.sort_key {
            config.export.sort_key = sort_key;
        }
        if self.precision.is_some() {
            config.export.precision = self.precision;
        }
    }
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// CSV written by `analyze`
    pub path: PathBuf,

    /// Reference labels (url,label) to measure agreement against
    #[arg(long)]
    pub labels: Option<PathBuf>,
}
