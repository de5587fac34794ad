use std::fmt;

/// A top-level submission as handed over by a [`crate::ForumSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub score: i64,
    pub pinned: bool,
}

impl Post {
    /// Absolute URL of the discussion page.
    pub fn source_url(&self) -> String {
        if self.permalink.starts_with("http://") || self.permalink.starts_with("https://") {
            self.permalink.clone()
        } else {
            format!("https://www.reddit.com{}", self.permalink)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawComment {
    pub id: String,
    pub body: String,
    pub score: i64,
    /// `None` when the account was deleted or never known.
    pub author: Option<String>,
}

/// One node of a flattened comment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    Comment(RawComment),
    /// Placeholder for replies the source did not (or could not) load.
    ContinuationMarker { id: String, count: u32 },
}

impl CommentNode {
    pub fn as_comment(&self) -> Option<&RawComment> {
        match self {
            CommentNode::Comment(comment) => Some(comment),
            CommentNode::ContinuationMarker { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_i8(self) -> i8 {
        match self {
            SentimentLabel::Positive => 1,
            SentimentLabel::Neutral => 0,
            SentimentLabel::Negative => -1,
        }
    }

    /// Label matching the sign of `score`; zero maps to neutral.
    pub fn from_sign(score: f64) -> Self {
        if score > 0.0 {
            SentimentLabel::Positive
        } else if score < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl From<SentimentLabel> for i8 {
    fn from(label: SentimentLabel) -> Self {
        label.as_i8()
    }
}

impl TryFrom<i8> for SentimentLabel {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SentimentLabel::Positive),
            0 => Ok(SentimentLabel::Neutral),
            -1 => Ok(SentimentLabel::Negative),
            other => Err(format!("sentiment label must be -1, 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Signed score in `[-1.0, 1.0]`.
    pub score: f64,
}

/// One analysed post: the representative comment and its sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub title: String,
    pub source_url: String,
    pub post_score: i64,
    pub comment_text: String,
    pub comment_score: i64,
    pub sentiment: SentimentResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_sign() {
        assert_eq!(SentimentLabel::from_sign(0.3), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_sign(-0.01), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_sign(0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_integer_conversion() {
        assert_eq!(i8::from(SentimentLabel::Negative), -1);
        assert_eq!(SentimentLabel::try_from(1), Ok(SentimentLabel::Positive));
        assert!(SentimentLabel::try_from(2).is_err());
    }

    #[test]
    fn test_source_url_from_permalink() {
        let post = Post {
            id: "abc".to_string(),
            title: "Title".to_string(),
            permalink: "/r/rust/comments/abc/title/".to_string(),
            score: 10,
            pinned: false,
        };
        assert_eq!(
            post.source_url(),
            "https://www.reddit.com/r/rust/comments/abc/title/"
        );
    }

    #[test]
    fn test_comment_node_discriminant() {
        let marker = CommentNode::ContinuationMarker {
            id: "more1".to_string(),
            count: 4,
        };
        assert!(marker.as_comment().is_none());
    }
}
