use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use threadmood_core::{ConfigError, CoreError, ScoringConfig};
use tracing::info;

/// Built-in word valences in the VADER lexicon layout, on the [-4, 4] scale.
const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.tsv");

const BOOSTER_INCREMENT: f64 = 0.293;

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously",
    "greatly", "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
    "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
    "thoroughly", "totally", "tremendously", "unbelievably", "unusually", "utterly", "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "less", "little", "marginally", "occasionally", "partly",
    "scarcely", "slightly", "somewhat",
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "neednt", "never", "none",
    "nope", "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "wasnt",
    "werent", "without", "wont", "wouldnt", "rarely", "seldom", "despite",
];

/// Multipliers applied to the next sentiment word by the polarity scorer.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.4),
    ("completely", 1.4),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("incredibly", 1.5),
    ("most", 1.3),
    ("pretty", 1.1),
    ("quite", 1.1),
    ("really", 1.3),
    ("so", 1.3),
    ("super", 1.3),
    ("too", 1.2),
    ("totally", 1.3),
    ("very", 1.3),
    ("fairly", 0.8),
    ("rather", 0.9),
    ("somewhat", 0.7),
    ("slightly", 0.5),
    ("barely", 0.5),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexiconEntry {
    /// Signed strength in [-4, 4].
    pub valence: f64,
    /// How opinionated the word is, in [0, 1].
    pub subjectivity: f64,
}

impl LexiconEntry {
    pub fn from_valence(valence: f64) -> Self {
        let valence = valence.clamp(-4.0, 4.0);
        let subjectivity = if valence == 0.0 {
            0.0
        } else {
            (0.3 + 0.15 * valence.abs()).min(1.0)
        };
        Self {
            valence,
            subjectivity,
        }
    }

    /// Valence rescaled to [-1, 1].
    pub fn polarity(&self) -> f64 {
        self.valence / 4.0
    }
}

/// Word-level sentiment data shared read-only by every scorer.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: HashMap<String, LexiconEntry>,
    boosters: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

static BUILTIN: Lazy<Arc<Lexicon>> = Lazy::new(|| Arc::new(Lexicon::builtin()));

impl Lexicon {
    pub fn builtin() -> Self {
        let entries = BUILTIN_LEXICON
            .lines()
            .filter_map(|line| parse_vader_line(line).ok().flatten())
            .map(|(token, valence)| (token, LexiconEntry::from_valence(valence)))
            .collect();

        let boosters = BOOSTERS_UP
            .iter()
            .map(|w| (*w, BOOSTER_INCREMENT))
            .chain(BOOSTERS_DOWN.iter().map(|w| (*w, -BOOSTER_INCREMENT)))
            .collect();

        Self {
            entries,
            boosters,
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// The process-wide built-in lexicon, built on first use.
    pub fn shared() -> Arc<Lexicon> {
        Arc::clone(&BUILTIN)
    }

    /// Built-in lexicon, or a copy of it with the configured file merged over it.
    pub fn from_config(config: &ScoringConfig) -> Result<Arc<Lexicon>, CoreError> {
        match &config.lexicon_path {
            None => Ok(Self::shared()),
            Some(path) => {
                let mut lexicon = Self::builtin();
                let merged = lexicon.merge_file(Path::new(path))?;
                info!("Merged {} lexicon entries from {}", merged, path);
                Ok(Arc::new(lexicon))
            }
        }
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<usize, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        self.merge_vader_str(&content)
    }

    /// Merges `token<TAB>mean[<TAB>...]` lines, the VADER lexicon file layout.
    /// Returns the number of entries read.
    pub fn merge_vader_str(&mut self, content: &str) -> Result<usize, ConfigError> {
        let mut merged = 0;
        for (index, line) in content.lines().enumerate() {
            let parsed = parse_vader_line(line).map_err(|_| ConfigError::InvalidValue {
                field: format!("lexicon line {}", index + 1),
                value: line.to_string(),
            })?;
            if let Some((token, valence)) = parsed {
                self.entries.insert(token, LexiconEntry::from_valence(valence));
                merged += 1;
            }
        }
        Ok(merged)
    }

    pub fn get(&self, word: &str) -> Option<&LexiconEntry> {
        self.entries.get(word)
    }

    pub fn booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    pub fn intensifier(&self, word: &str) -> Option<f64> {
        self.intensifiers.get(word).copied()
    }

    pub fn is_negation(&self, word: &str) -> bool {
        word.contains("n't") || NEGATIONS.contains(&word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `Ok(None)` for blank, comment and token-less lines.
fn parse_vader_line(line: &str) -> Result<Option<(String, f64)>, std::num::ParseFloatError> {
    let line = line.trim_end();
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split('\t');
    let token = fields.next().unwrap_or_default().trim();
    let valence: f64 = fields.next().unwrap_or_default().trim().parse()?;
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some((token.to_lowercase(), valence)))
}
