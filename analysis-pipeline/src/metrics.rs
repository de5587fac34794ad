use std::collections::HashMap;
use threadmood_core::{ResultRecord, SentimentLabel};

/// Percentage of records whose label agrees with the sign of their score.
///
/// This checks the pipeline against itself; a consistent build scores 100.
/// Zero for an empty collection.
pub fn accuracy(records: &[ResultRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let consistent = records
        .iter()
        .filter(|record| SentimentLabel::from_sign(record.sentiment.score) == record.sentiment.label)
        .count();
    consistent as f64 / records.len() as f64 * 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    /// Mean of `|score|`.
    pub average_magnitude: f64,
}

/// Label shares in percent. All fields are zero for an empty collection.
pub fn distribution(records: &[ResultRecord]) -> Distribution {
    if records.is_empty() {
        return Distribution::default();
    }

    let mut dist = Distribution::default();
    let mut magnitude = 0.0;
    for record in records {
        match record.sentiment.label {
            SentimentLabel::Positive => dist.positive += 1,
            SentimentLabel::Negative => dist.negative += 1,
            SentimentLabel::Neutral => dist.neutral += 1,
        }
        magnitude += record.sentiment.score.abs();
    }

    let total = records.len() as f64;
    dist.positive_pct = dist.positive as f64 / total * 100.0;
    dist.negative_pct = dist.negative as f64 / total * 100.0;
    dist.neutral_pct = dist.neutral as f64 / total * 100.0;
    dist.average_magnitude = magnitude / total;
    dist
}

/// Comparison against externally supplied labels, keyed by post URL.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Agreement {
    /// Records that had a reference label.
    pub labelled: usize,
    pub agreeing: usize,
    pub percent: f64,
}

pub fn ground_truth_agreement(
    records: &[ResultRecord],
    labels: &HashMap<String, SentimentLabel>,
) -> Agreement {
    let mut agreement = Agreement::default();
    for record in records {
        if let Some(expected) = labels.get(&record.source_url) {
            agreement.labelled += 1;
            if *expected == record.sentiment.label {
                agreement.agreeing += 1;
            }
        }
    }
    if agreement.labelled > 0 {
        agreement.percent = agreement.agreeing as f64 / agreement.labelled as f64 * 100.0;
    }
    agreement
}

/// Everything reported about a record collection, recomputed on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub total: usize,
    pub accuracy: f64,
    pub distribution: Distribution,
    pub agreement: Option<Agreement>,
}

impl MetricsSnapshot {
    pub fn compute(records: &[ResultRecord]) -> Self {
        Self {
            total: records.len(),
            accuracy: accuracy(records),
            distribution: distribution(records),
            agreement: None,
        }
    }

    pub fn with_ground_truth(
        records: &[ResultRecord],
        labels: &HashMap<String, SentimentLabel>,
    ) -> Self {
        Self {
            agreement: Some(ground_truth_agreement(records, labels)),
            ..Self::compute(records)
        }
    }
}
