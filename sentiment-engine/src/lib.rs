pub mod lexicon;
pub mod meaningful;
pub mod normalizer;
pub mod scorer;
pub mod selector;
pub mod stopwords;

pub use lexicon::{Lexicon, LexiconEntry};
pub use meaningful::{is_meaningful, MeaningfulnessFilter};
pub use normalizer::{word_count, TextNormalizer};
pub use scorer::{
    CompoundScorer, PolarityScorer, Scores, SentimentAnalyzer, SentimentScorer, Thresholds,
};
pub use selector::{CommentSelector, SelectedComment};
