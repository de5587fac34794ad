use crate::normalizer::word_count;
use crate::scorer::SentimentAnalyzer;
use threadmood_core::{MeaningfulnessConfig, MeaningfulnessMetric};

/// Gate deciding whether normalized text carries enough signal to represent
/// a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct MeaningfulnessFilter {
    metric: MeaningfulnessMetric,
    min_words: usize,
    min_abs_score: f64,
    min_subjectivity: f64,
}

impl Default for MeaningfulnessFilter {
    fn default() -> Self {
        Self::from(&MeaningfulnessConfig::default())
    }
}

impl From<&MeaningfulnessConfig> for MeaningfulnessFilter {
    fn from(config: &MeaningfulnessConfig) -> Self {
        Self {
            metric: config.metric,
            min_words: config.min_words,
            min_abs_score: config.min_abs_score,
            min_subjectivity: config.min_subjectivity,
        }
    }
}

impl MeaningfulnessFilter {
    /// Word count plus score magnitude.
    pub fn magnitude(min_words: usize, min_abs_score: f64) -> Self {
        Self {
            metric: MeaningfulnessMetric::Magnitude,
            min_words,
            min_abs_score,
            min_subjectivity: 0.0,
        }
    }

    /// Word count plus subjectivity.
    pub fn subjectivity(min_words: usize, min_subjectivity: f64) -> Self {
        Self {
            metric: MeaningfulnessMetric::Subjectivity,
            min_words,
            min_abs_score: 0.0,
            min_subjectivity,
        }
    }

    pub fn metric(&self) -> MeaningfulnessMetric {
        self.metric
    }

    /// Scores with `analyzer`, the same one used for classification.
    pub fn is_meaningful(&self, text: &str, analyzer: &SentimentAnalyzer) -> bool {
        if word_count(text) < self.min_words {
            return false;
        }

        let scores = analyzer.scores(text);
        match self.metric {
            MeaningfulnessMetric::Magnitude => scores.score.abs() >= self.min_abs_score,
            // Objective text (subjectivity at the floor) is rejected
            MeaningfulnessMetric::Subjectivity => scores.subjectivity > self.min_subjectivity,
        }
    }
}

/// One-shot form of [`MeaningfulnessFilter::magnitude`].
pub fn is_meaningful(
    text: &str,
    min_words: usize,
    min_abs_score: f64,
    analyzer: &SentimentAnalyzer,
) -> bool {
    MeaningfulnessFilter::magnitude(min_words, min_abs_score).is_meaningful(text, analyzer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::scorer::Thresholds;
    use threadmood_core::ScoringScheme;

    fn compound() -> SentimentAnalyzer {
        SentimentAnalyzer::new(
            ScoringScheme::Compound,
            Lexicon::shared(),
            Thresholds::symmetric(0.05),
        )
    }

    #[test]
    fn test_too_few_words() {
        assert!(!is_meaningful("great", 3, 0.1, &compound()));
        assert!(!is_meaningful("", 0, 0.1, &compound()));
    }

    #[test]
    fn test_magnitude_gate() {
        let analyzer = compound();
        assert!(is_meaningful("this is absolutely great", 3, 0.1, &analyzer));
        assert!(!is_meaningful("the report is on the table", 3, 0.1, &analyzer));
    }

    #[test]
    fn test_magnitude_boundary_is_inclusive() {
        let analyzer = compound();
        let text = "this looks good to me";
        let score = analyzer.score(text).abs();
        assert!(is_meaningful(text, 3, score, &analyzer));
        assert!(!is_meaningful(text, 3, score + 1e-9, &analyzer));
    }

    #[test]
    fn test_subjectivity_gate() {
        let filter = MeaningfulnessFilter::subjectivity(3, 0.1);
        let analyzer = SentimentAnalyzer::new(
            ScoringScheme::Polarity,
            Lexicon::shared(),
            Thresholds::symmetric(0.1),
        );
        assert!(filter.is_meaningful("that was a wonderful talk", &analyzer));
        assert!(!filter.is_meaningful("the meeting starts at noon", &analyzer));
    }

    #[test]
    fn test_from_config() {
        let config = MeaningfulnessConfig {
            metric: MeaningfulnessMetric::Subjectivity,
            min_words: 6,
            ..Default::default()
        };
        let filter = MeaningfulnessFilter::from(&config);
        assert_eq!(filter.metric(), MeaningfulnessMetric::Subjectivity);
        assert!(!filter.is_meaningful("wonderful wonderful wonderful", &compound()));
    }
}
