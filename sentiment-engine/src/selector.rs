use crate::meaningful::MeaningfulnessFilter;
use crate::normalizer::TextNormalizer;
use crate::scorer::SentimentAnalyzer;
use threadmood_core::{AnalysisConfig, AppConfig, CommentNode, RawComment};
use tracing::debug;

/// The comment picked to represent a thread, with its normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedComment<'a> {
    pub comment: &'a RawComment,
    pub normalized: String,
}

/// Picks the highest-scored comment that survives moderation, length and
/// meaningfulness checks.
#[derive(Debug, Clone)]
pub struct CommentSelector {
    normalizer: TextNormalizer,
    filter: MeaningfulnessFilter,
    min_comment_length: usize,
    /// Lowercased.
    moderator_names: Vec<String>,
}

impl CommentSelector {
    pub fn new(
        normalizer: TextNormalizer,
        filter: MeaningfulnessFilter,
        min_comment_length: usize,
        moderator_names: &[String],
    ) -> Self {
        Self {
            normalizer,
            filter,
            min_comment_length,
            moderator_names: moderator_names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let AnalysisConfig {
            min_comment_length,
            moderator_names,
            ..
        } = &config.analysis;
        Self::new(
            TextNormalizer::new(config.normalization.clone()),
            MeaningfulnessFilter::from(&config.meaningfulness),
            *min_comment_length,
            moderator_names,
        )
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn min_comment_length(&self) -> usize {
        self.min_comment_length
    }

    fn is_moderator(&self, author: &str) -> bool {
        let author = author.to_lowercase();
        self.moderator_names.iter().any(|name| *name == author)
    }

    /// Real comments with a known, non-moderator author and a long enough body.
    pub fn candidates<'a>(&self, comments: &'a [CommentNode]) -> Vec<&'a RawComment> {
        comments
            .iter()
            .filter_map(CommentNode::as_comment)
            .filter(|comment| match comment.author.as_deref() {
                None => false,
                Some(author) => !self.is_moderator(author),
            })
            .filter(|comment| comment.body.chars().count() >= self.min_comment_length)
            .collect()
    }

    /// `None` is an ordinary outcome: nothing qualified.
    pub fn select<'a>(
        &self,
        comments: &'a [CommentNode],
        analyzer: &SentimentAnalyzer,
    ) -> Option<SelectedComment<'a>> {
        let mut candidates = self.candidates(comments);
        if candidates.is_empty() {
            return None;
        }

        // Stable, so equal scores keep encounter order
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        candidates.into_iter().find_map(|comment| {
            let normalized = self.normalizer.normalize(&comment.body);
            if normalized.is_empty() || !self.filter.is_meaningful(&normalized, analyzer) {
                debug!("Comment {} rejected as not meaningful", comment.id);
                return None;
            }
            Some(SelectedComment {
                comment,
                normalized,
            })
        })
    }
}
