use crate::lexicon::Lexicon;
use std::fmt;
use std::sync::Arc;
use threadmood_core::{CoreError, ScoringConfig, ScoringScheme, SentimentLabel, SentimentResult};

/// Normalization constant of the compound score, `x / sqrt(x^2 + alpha)`.
const COMPOUND_ALPHA: f64 = 15.0;
const COMPOUND_NEGATION: f64 = -0.74;
/// Booster effect fades with distance from the word it modifies.
const BOOSTER_DAMPING: [f64; 3] = [1.0, 0.95, 0.9];
const POLARITY_NEGATION: f64 = -0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scores {
    /// Signed sentiment in [-1, 1].
    pub score: f64,
    /// In [0, 1]; zero when no opinion word matched.
    pub subjectivity: f64,
}

/// Maps normalized text to a sentiment score. Implementations are pure.
pub trait SentimentScorer: fmt::Debug + Send + Sync {
    fn scores(&self, text: &str) -> Scores;

    fn score(&self, text: &str) -> f64 {
        self.scores(text).score
    }
}

fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c| c == '\'' || c == '"'))
        .filter(|word| !word.is_empty())
        .collect()
}

/// Valence sum with booster, negation and contrastive "but" rules,
/// squashed into [-1, 1].
#[derive(Debug, Clone)]
pub struct CompoundScorer {
    lexicon: Arc<Lexicon>,
}

impl CompoundScorer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    fn word_valence(&self, words: &[&str], index: usize) -> f64 {
        let Some(entry) = self.lexicon.get(words[index]) else {
            return 0.0;
        };
        let mut valence = entry.valence;

        for (distance, damping) in (1..=3).zip(BOOSTER_DAMPING) {
            if index < distance {
                break;
            }
            if let Some(increment) = self.lexicon.booster(words[index - distance]) {
                let signed = if valence < 0.0 { -increment } else { increment };
                valence += signed * damping;
            }
        }

        let negated = (1..=3)
            .filter(|distance| index >= *distance)
            .any(|distance| self.lexicon.is_negation(words[index - distance]));
        if negated {
            valence *= COMPOUND_NEGATION;
        }

        valence
    }
}

impl SentimentScorer for CompoundScorer {
    fn scores(&self, text: &str) -> Scores {
        let words = tokens(text);
        let mut valences: Vec<f64> = (0..words.len())
            .map(|index| self.word_valence(&words, index))
            .collect();

        if let Some(pivot) = words.iter().position(|word| *word == "but") {
            for (index, valence) in valences.iter_mut().enumerate() {
                if index < pivot {
                    *valence *= 0.5;
                } else if index > pivot {
                    *valence *= 1.5;
                }
            }
        }

        let matched: Vec<f64> = words
            .iter()
            .filter_map(|word| self.lexicon.get(word))
            .map(|entry| entry.subjectivity)
            .collect();

        let sum: f64 = valences.iter().sum();
        let score = if sum == 0.0 {
            0.0
        } else {
            (sum / (sum * sum + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0)
        };

        Scores {
            score,
            subjectivity: mean(&matched).clamp(0.0, 1.0),
        }
    }
}

/// Mean word polarity with intensifier multipliers and a damped negation flip.
#[derive(Debug, Clone)]
pub struct PolarityScorer {
    lexicon: Arc<Lexicon>,
}

impl PolarityScorer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }
}

impl SentimentScorer for PolarityScorer {
    fn scores(&self, text: &str) -> Scores {
        let words = tokens(text);
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for (index, word) in words.iter().enumerate() {
            let Some(entry) = self.lexicon.get(word) else {
                continue;
            };
            let mut polarity = entry.polarity();
            let mut subjectivity = entry.subjectivity;

            let previous = index.checked_sub(1).map(|i| words[i]);
            let intensifier = previous.and_then(|w| self.lexicon.intensifier(w));
            if let Some(multiplier) = intensifier {
                polarity *= multiplier;
                subjectivity *= multiplier;
            }

            // "not good" and "not very good" both flip
            let negated = previous.is_some_and(|w| self.lexicon.is_negation(w))
                || (intensifier.is_some()
                    && index >= 2
                    && self.lexicon.is_negation(words[index - 2]));
            if negated {
                polarity *= POLARITY_NEGATION;
            }

            polarities.push(polarity.clamp(-1.0, 1.0));
            subjectivities.push(subjectivity.clamp(0.0, 1.0));
        }

        Scores {
            score: mean(&polarities).clamp(-1.0, 1.0),
            subjectivity: mean(&subjectivities).clamp(0.0, 1.0),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Strict cut-offs: a score equal to a threshold is neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub positive: f64,
    pub negative: f64,
}

impl Thresholds {
    pub fn symmetric(threshold: f64) -> Self {
        Self {
            positive: threshold.abs(),
            negative: -threshold.abs(),
        }
    }

    pub fn classify(&self, score: f64) -> SentimentLabel {
        if score > self.positive {
            SentimentLabel::Positive
        } else if score < self.negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl From<&ScoringConfig> for Thresholds {
    fn from(config: &ScoringConfig) -> Self {
        let (positive, negative) = config.thresholds();
        Self { positive, negative }
    }
}

/// A scorer paired with its thresholds. The same instance backs both the
/// meaningfulness check and the final classification.
#[derive(Debug)]
pub struct SentimentAnalyzer {
    scheme: ScoringScheme,
    scorer: Box<dyn SentimentScorer>,
    thresholds: Thresholds,
}

impl SentimentAnalyzer {
    pub fn new(scheme: ScoringScheme, lexicon: Arc<Lexicon>, thresholds: Thresholds) -> Self {
        let scorer: Box<dyn SentimentScorer> = match scheme {
            ScoringScheme::Compound => Box::new(CompoundScorer::new(lexicon)),
            ScoringScheme::Polarity => Box::new(PolarityScorer::new(lexicon)),
        };
        Self {
            scheme,
            scorer,
            thresholds,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, CoreError> {
        let lexicon = Lexicon::from_config(config)?;
        Ok(Self::new(config.scheme, lexicon, Thresholds::from(config)))
    }

    pub fn scheme(&self) -> ScoringScheme {
        self.scheme
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn scores(&self, text: &str) -> Scores {
        self.scorer.scores(text)
    }

    pub fn score(&self, text: &str) -> f64 {
        self.scorer.score(text)
    }

    pub fn classify(&self, score: f64) -> SentimentLabel {
        self.thresholds.classify(score)
    }

    pub fn analyze(&self, text: &str) -> SentimentResult {
        let score = self.score(text);
        SentimentResult {
            label: self.classify(score),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound() -> CompoundScorer {
        CompoundScorer::new(Lexicon::shared())
    }

    fn polarity() -> PolarityScorer {
        PolarityScorer::new(Lexicon::shared())
    }

    #[test]
    fn test_compound_direction() {
        assert!(compound().score("this is a great idea") > 0.0);
        assert!(compound().score("this is a terrible idea") < 0.0);
        assert_eq!(compound().score("the cat sat on the mat"), 0.0);
        assert_eq!(compound().score(""), 0.0);
    }

    #[test]
    fn test_compound_negation_flips() {
        let plain = compound().score("this is a great idea");
        let negated = compound().score("this is not a great idea");
        assert!(negated < 0.0);
        assert!(negated.abs() < plain.abs());
    }

    #[test]
    fn test_compound_boosters() {
        let plain = compound().score("good");
        assert!(compound().score("very good") > plain);
        assert!(compound().score("slightly good") < plain);
    }

    #[test]
    fn test_compound_but_rule() {
        // Clause after "but" dominates
        let score = compound().score("the food was good but the service was terrible");
        assert!(score < 0.0);
    }

    #[test]
    fn test_compound_matches_formula() {
        let expected = 3.1 / (3.1f64 * 3.1 + 15.0).sqrt();
        assert!((compound().score("great") - expected).abs() < 1e-12);
    }

    #[test]
    fn test_compound_is_bounded() {
        let text = "great ".repeat(200);
        let score = compound().score(&text);
        assert!(score <= 1.0 && score > 0.99);
    }

    #[test]
    fn test_polarity_values() {
        let great = polarity().scores("great");
        assert!((great.score - 0.775).abs() < 1e-12);
        assert!(great.subjectivity > 0.0);

        let negated = polarity().score("not great");
        assert!((negated + 0.3875).abs() < 1e-12);

        assert_eq!(polarity().score("very great"), 1.0);
        assert_eq!(polarity().scores("plain words only"), Scores::default());
    }

    #[test]
    fn test_polarity_averages_words() {
        let score = polarity().score("good and bad");
        let expected = (1.9 / 4.0 + -2.5 / 4.0) / 2.0;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_boundaries_are_neutral() {
        let thresholds = Thresholds::symmetric(0.05);
        assert_eq!(thresholds.classify(0.05), SentimentLabel::Neutral);
        assert_eq!(thresholds.classify(-0.05), SentimentLabel::Neutral);
        assert_eq!(thresholds.classify(0.0501), SentimentLabel::Positive);
        assert_eq!(thresholds.classify(-0.0501), SentimentLabel::Negative);
        assert_eq!(thresholds.classify(0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_thresholds_from_config() {
        let config = ScoringConfig {
            scheme: ScoringScheme::Polarity,
            ..Default::default()
        };
        assert_eq!(Thresholds::from(&config), Thresholds::symmetric(0.1));
    }

    #[test]
    fn test_analyzer_is_consistent() {
        let analyzer = SentimentAnalyzer::from_config(&ScoringConfig::default()).unwrap();
        assert_eq!(analyzer.scheme(), ScoringScheme::Compound);

        for text in ["what a wonderful day", "this is awful", "a table and a chair"] {
            let result = analyzer.analyze(text);
            assert_eq!(result.score, analyzer.score(text));
            assert_eq!(result.label, analyzer.classify(result.score));
        }
    }
}
