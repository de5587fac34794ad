use crate::stopwords::is_stopword;
use once_cell::sync::Lazy;
use regex::Regex;
use threadmood_core::{LetterPolicy, NormalizationConfig};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:[a-z][a-z0-9+.\-]*://|www\.)\S+").unwrap());

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{N}+").unwrap());

/// Pictographs, dingbats, regional indicators and the joiners that glue them.
fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
        | 0x2300..=0x23FF
        | 0x2600..=0x27BF
        | 0x2B00..=0x2BFF
        | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x200D
        | 0xFE00..=0xFE0F
        | 0xE0020..=0xE007F)
}

/// Cleans raw comment bodies into the text that gets scored and exported.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    options: NormalizationConfig,
}

impl TextNormalizer {
    pub fn new(options: NormalizationConfig) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizationConfig {
        &self.options
    }

    /// Output holds lowercase letters, single spaces and `'`/`"` (plus digits
    /// and emoji when their removal is switched off). Never fails.
    pub fn normalize(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let mut text = URL_RE.replace_all(raw, " ").into_owned();

        if self.options.remove_emojis {
            text.retain(|c| !is_emoji(c));
        }
        if self.options.remove_numbers {
            text = DIGITS_RE.replace_all(&text, "").into_owned();
        }

        // Lowercase first: `İ` lowers to `i` plus a combining mark the filter must see.
        // Dropped characters become spaces so words on either side stay apart.
        let spaced: String = text
            .to_lowercase()
            .chars()
            .map(|c| if self.keeps(c) { c } else { ' ' })
            .collect();

        let words = spaced.split_whitespace();
        if self.options.remove_stopwords {
            words
                .filter(|word| !is_stopword(word))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            words.collect::<Vec<_>>().join(" ")
        }
    }

    fn keeps(&self, c: char) -> bool {
        let letter = match self.options.letters {
            LetterPolicy::Ascii => c.is_ascii_alphabetic(),
            LetterPolicy::Unicode => c.is_alphabetic(),
        };
        letter
            || c.is_whitespace()
            || c == '\''
            || c == '"'
            || (!self.options.remove_numbers && c.is_numeric())
            || (!self.options.remove_emojis && is_emoji(c))
    }
}

/// Whitespace-separated word count of normalized text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::default()
    }

    fn with(config: impl FnOnce(&mut NormalizationConfig)) -> TextNormalizer {
        let mut options = NormalizationConfig::default();
        config(&mut options);
        TextNormalizer::new(options)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalizer().normalize(""), "");
        assert_eq!(normalizer().normalize("   \n\t "), "");
        assert_eq!(normalizer().normalize("!!! ... ???"), "");
    }

    #[test]
    fn test_urls_are_removed() {
        let out = normalizer().normalize("Read this https://example.com/a?b=c and www.foo.org/x now");
        assert_eq!(out, "read this and now");
        assert!(!URL_RE.is_match(&out));
    }

    #[test]
    fn test_punctuation_becomes_space() {
        let out = normalizer().normalize("Great,idea!Really-good");
        assert_eq!(out, "great idea really good");
    }

    #[test]
    fn test_quotes_and_apostrophes_survive() {
        let out = normalizer().normalize("I don't think \"safety\" is solved.");
        assert_eq!(out, "i don't think \"safety\" is solved");
    }

    #[test]
    fn test_digits_follow_option() {
        let removed = normalizer().normalize("Top 10 reasons, 2024 edition");
        assert_eq!(removed, "top reasons edition");
        assert!(!removed.chars().any(|c| c.is_ascii_digit()));

        let kept = with(|o| o.remove_numbers = false).normalize("Top 10 reasons, 2024 edition");
        assert_eq!(kept, "top 10 reasons 2024 edition");
    }

    #[test]
    fn test_emoji_follow_option() {
        let removed = normalizer().normalize("love it 😍🔥 so much");
        assert_eq!(removed, "love it so much");

        let kept = with(|o| o.remove_emojis = false).normalize("love it 😍 so much");
        assert_eq!(kept, "love it 😍 so much");
    }

    #[test]
    fn test_letter_policy() {
        let ascii = normalizer().normalize("Café naïve résumé");
        assert_eq!(ascii, "caf na ve r sum");

        let unicode = with(|o| o.letters = LetterPolicy::Unicode).normalize("Café naïve résumé");
        assert_eq!(unicode, "café naïve résumé");
    }

    #[test]
    fn test_lowercasing_cannot_leak_marks() {
        let out = with(|o| o.letters = LetterPolicy::Unicode).normalize("İstanbul ÇOK güzel");
        assert!(out.chars().all(|c| c.is_alphabetic() || c == ' '), "{out:?}");
        assert!(!out.contains('\u{0307}'));
        assert_eq!(out, out.to_lowercase());
        assert!(out.ends_with("çok güzel"));
    }

    #[test]
    fn test_stopword_removal() {
        let out = with(|o| o.remove_stopwords = true)
            .normalize("This is NOT the best idea that I have seen");
        assert_eq!(out, "best idea seen");
    }

    #[test]
    fn test_output_invariants() {
        let samples = [
            "  Multiple   spaces\n\nand\tTABS  ",
            "MiXeD CaSe with 123 numbers and http://x.y/z links",
            "Emoji 🚀 and symbols #$%^&*() everywhere",
        ];
        for sample in samples {
            let out = normalizer().normalize(sample);
            assert!(!out.contains("  "));
            assert_eq!(out, out.trim());
            assert_eq!(out, out.to_lowercase());
            assert!(!out.chars().any(|c| c.is_ascii_digit()));
            assert!(!out.contains("http"));
        }
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one two three"), 3);
    }
}
