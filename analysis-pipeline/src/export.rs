use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use threadmood_core::{
    AppConfig, CoreError, ExportError, ResultRecord, ScoringScheme, SentimentLabel,
    SentimentResult, SortKey,
};
use tracing::{info, warn};

/// Every column before the scheme-named score column.
pub const LEADING_COLUMNS: [&str; 6] = [
    "title",
    "url",
    "post_upvotes",
    "comment_text",
    "comment_upvotes",
    "sentiment",
];

/// Writes result records as CSV, highest score first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exporter {
    sort_key: SortKey,
    scheme: ScoringScheme,
    precision: Option<usize>,
}

impl Exporter {
    pub fn new(sort_key: SortKey, scheme: ScoringScheme) -> Self {
        Self {
            sort_key,
            scheme,
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.export.sort_key, config.scoring.scheme)
            .with_precision(config.export.precision)
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = LEADING_COLUMNS.to_vec();
        header.push(self.scheme.column_name());
        header
    }

    /// Descending by the sort key; ties keep collection order.
    pub fn sorted<'a>(&self, records: &'a [ResultRecord]) -> Vec<&'a ResultRecord> {
        let mut sorted: Vec<&ResultRecord> = records.iter().collect();
        match self.sort_key {
            SortKey::CommentScore => sorted.sort_by(|a, b| b.comment_score.cmp(&a.comment_score)),
            SortKey::PostScore => sorted.sort_by(|a, b| b.post_score.cmp(&a.post_score)),
        }
        sorted
    }

    fn format_score(&self, score: f64) -> String {
        match self.precision {
            Some(places) => format!("{:.*}", places, score),
            None => score.to_string(),
        }
    }

    pub fn write<W: io::Write>(
        &self,
        records: &[ResultRecord],
        writer: W,
    ) -> Result<usize, ExportError> {
        if records.is_empty() {
            return Err(ExportError::NoRecords);
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;

        for record in self.sorted(records) {
            csv_writer.write_record([
                record.title.clone(),
                record.source_url.clone(),
                record.post_score.to_string(),
                record.comment_text.clone(),
                record.comment_score.to_string(),
                record.sentiment.label.as_i8().to_string(),
                self.format_score(record.sentiment.score),
            ])?;
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(records.len())
    }

    /// Creates the file only when there is something to write.
    pub fn export_to_path(&self, records: &[ResultRecord], path: &Path) -> Result<usize, CoreError> {
        if records.is_empty() {
            warn!("No data to export, {} not written", path.display());
            return Err(ExportError::NoRecords.into());
        }

        let file = File::create(path)?;
        let written = self.write(records, io::BufWriter::new(file))?;
        info!("Exported {} records to {}", written, path.display());
        Ok(written)
    }
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize, ExportError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ExportError::MissingColumn {
            column: column.to_string(),
        })
}

fn parse_field<T: std::str::FromStr>(
    row: &csv::StringRecord,
    row_number: usize,
    index: usize,
    column: &str,
) -> Result<T, ExportError> {
    let value = row.get(index).unwrap_or_default();
    value.trim().parse().map_err(|_| ExportError::InvalidField {
        row: row_number,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn text_field(row: &csv::StringRecord, index: usize) -> String {
    row.get(index).unwrap_or_default().to_string()
}

/// Reads a table written by [`Exporter`], detecting the score column.
pub fn read_records<R: io::Read>(
    reader: R,
) -> Result<(Vec<ResultRecord>, ScoringScheme), ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let (scheme, score_index) = [ScoringScheme::Compound, ScoringScheme::Polarity]
        .into_iter()
        .find_map(|scheme| {
            column_index(&headers, scheme.column_name())
                .ok()
                .map(|index| (scheme, index))
        })
        .ok_or_else(|| ExportError::MissingColumn {
            column: "compound|polarity".to_string(),
        })?;

    let mut indices = [0usize; 6];
    for (slot, column) in indices.iter_mut().zip(LEADING_COLUMNS) {
        *slot = column_index(&headers, column)?;
    }
    let [title, url, post_upvotes, comment_text, comment_upvotes, sentiment] = indices;

    let mut records = Vec::new();
    for (offset, row) in csv_reader.records().enumerate() {
        let row = row?;
        // Header is row 1
        let row_number = offset + 2;

        let raw_label: i8 = parse_field(&row, row_number, sentiment, "sentiment")?;
        let label = SentimentLabel::try_from(raw_label).map_err(|_| ExportError::InvalidField {
            row: row_number,
            column: "sentiment".to_string(),
            value: raw_label.to_string(),
        })?;

        records.push(ResultRecord {
            title: text_field(&row, title),
            source_url: text_field(&row, url),
            post_score: parse_field(&row, row_number, post_upvotes, "post_upvotes")?,
            comment_text: text_field(&row, comment_text),
            comment_score: parse_field(&row, row_number, comment_upvotes, "comment_upvotes")?,
            sentiment: SentimentResult {
                label,
                score: parse_field(&row, row_number, score_index, scheme.column_name())?,
            },
        });
    }

    Ok((records, scheme))
}

pub fn read_records_from_path(path: &Path) -> Result<(Vec<ResultRecord>, ScoringScheme), CoreError> {
    let file = File::open(path)?;
    Ok(read_records(io::BufReader::new(file))?)
}

fn parse_label(value: &str) -> Option<SentimentLabel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "+1" | "positive" | "pos" => Some(SentimentLabel::Positive),
        "0" | "neutral" | "neu" => Some(SentimentLabel::Neutral),
        "-1" | "negative" | "neg" => Some(SentimentLabel::Negative),
        _ => None,
    }
}

/// Reference labels from a `url,label` table. Labels may be `1/0/-1` or
/// `positive/neutral/negative`.
pub fn load_labels<R: io::Read>(
    reader: R,
) -> Result<HashMap<String, SentimentLabel>, ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let url = column_index(&headers, "url")?;
    let label = column_index(&headers, "label")?;

    let mut labels = HashMap::new();
    for (offset, row) in csv_reader.records().enumerate() {
        let row = row?;
        let raw = row.get(label).unwrap_or_default();
        let parsed = parse_label(raw).ok_or_else(|| ExportError::InvalidField {
            row: offset + 2,
            column: "label".to_string(),
            value: raw.to_string(),
        })?;
        labels.insert(text_field(&row, url).trim().to_string(), parsed);
    }
    Ok(labels)
}

pub fn load_labels_from_path(path: &Path) -> Result<HashMap<String, SentimentLabel>, CoreError> {
    let file = File::open(path)?;
    Ok(load_labels(io::BufReader::new(file))?)
}
