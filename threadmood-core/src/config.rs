//! TOML configuration for an analysis run.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//! Reddit credentials never live in the file and are read from the
//! environment instead.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "threadmood.toml";
pub const DEFAULT_USER_AGENT: &str = "threadmood/0.1 (comment sentiment analysis)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub normalization: NormalizationConfig,
    pub scoring: ScoringConfig,
    pub meaningfulness: MeaningfulnessConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub community: Option<String>,
    pub limit: usize,
    pub time_filter: String,
    pub min_comment_length: usize,
    /// Compared case-insensitively against comment authors.
    pub moderator_names: Vec<String>,
    pub max_more_expansions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            community: None,
            limit: 100,
            time_filter: "all".to_string(),
            min_comment_length: 10,
            moderator_names: vec!["automoderator".to_string()],
            max_more_expansions: 32,
        }
    }
}

/// Which characters survive normalization as "letters".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterPolicy {
    #[default]
    Ascii,
    Unicode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub remove_emojis: bool,
    pub remove_numbers: bool,
    pub remove_stopwords: bool,
    pub letters: LetterPolicy,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            remove_emojis: true,
            remove_numbers: true,
            remove_stopwords: false,
            letters: LetterPolicy::Ascii,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringScheme {
    /// Valence sum normalized into a compound score.
    #[default]
    Compound,
    /// Mean word polarity with subjectivity.
    Polarity,
}

impl ScoringScheme {
    pub fn default_threshold(self) -> f64 {
        match self {
            ScoringScheme::Compound => 0.05,
            ScoringScheme::Polarity => 0.1,
        }
    }

    /// Name of the score column in exported tables.
    pub fn column_name(self) -> &'static str {
        match self {
            ScoringScheme::Compound => "compound",
            ScoringScheme::Polarity => "polarity",
        }
    }
}

impl std::str::FromStr for ScoringScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compound" => Ok(ScoringScheme::Compound),
            "polarity" => Ok(ScoringScheme::Polarity),
            other => Err(ConfigError::InvalidValue {
                field: "scoring.scheme".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub scheme: ScoringScheme,
    pub positive_threshold: Option<f64>,
    pub negative_threshold: Option<f64>,
    pub lexicon_path: Option<String>,
}

impl ScoringConfig {
    /// `(positive, negative)` thresholds, defaulting to the scheme's symmetric pair.
    pub fn thresholds(&self) -> (f64, f64) {
        let default = self.scheme.default_threshold();
        match (self.positive_threshold, self.negative_threshold) {
            (Some(pos), Some(neg)) => (pos, neg),
            (Some(pos), None) => (pos, -pos),
            (None, Some(neg)) => (-neg, neg),
            (None, None) => (default, -default),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeaningfulnessMetric {
    #[default]
    Magnitude,
    Subjectivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeaningfulnessConfig {
    pub metric: MeaningfulnessMetric,
    pub min_words: usize,
    pub min_abs_score: f64,
    pub min_subjectivity: f64,
}

impl Default for MeaningfulnessConfig {
    fn default() -> Self {
        Self {
            metric: MeaningfulnessMetric::Magnitude,
            min_words: 3,
            min_abs_score: 0.1,
            min_subjectivity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CommentScore,
    PostScore,
}

impl std::str::FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "comment_score" | "comment" => Ok(SortKey::CommentScore),
            "post_score" | "post" => Ok(SortKey::PostScore),
            other => Err(ConfigError::InvalidValue {
                field: "export.sort_key".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub path: String,
    pub sort_key: SortKey,
    /// Decimal places for the score column; full precision when absent.
    pub precision: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: "sentiment_analysis_results.csv".to_string(),
            sort_key: SortKey::CommentScore,
            precision: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Loads `path` when given, else `threadmood.toml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.limit".to_string(),
                value: "0".to_string(),
            });
        }
        if let Some(community) = &self.analysis.community {
            if community.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "analysis.community".to_string(),
                    value: community.clone(),
                });
            }
        }

        let (positive, negative) = self.scoring.thresholds();
        if !(0.0..=1.0).contains(&positive) || !(-1.0..=0.0).contains(&negative) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "thresholds must lie in [0, 1] and [-1, 0], got {} and {}",
                    positive, negative
                ),
            });
        }
        if (positive + negative).abs() > 1e-9 {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "thresholds must be symmetric, got {} and {}",
                    positive, negative
                ),
            });
        }

        let meaningfulness = &self.meaningfulness;
        if meaningfulness.min_abs_score < 0.0 || meaningfulness.min_subjectivity < 0.0 {
            return Err(ConfigError::ValidationFailed {
                reason: "meaningfulness minimums must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Script-application credentials for the Reddit API.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = required_env("REDDIT_CLIENT_ID")?;
        let client_secret = required_env("REDDIT_CLIENT_SECRET")?;
        let user_agent =
            std::env::var("REDDIT_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }
}

fn required_env(var_name: &str) -> Result<String, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }),
    }
}
