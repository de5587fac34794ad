pub mod export;
pub mod metrics;
pub mod runner;

pub use export::{
    load_labels, load_labels_from_path, read_records, read_records_from_path, Exporter,
    LEADING_COLUMNS,
};
pub use metrics::{
    accuracy, distribution, ground_truth_agreement, Agreement, Distribution, MetricsSnapshot,
};
pub use runner::{CancellationFlag, PipelineRunner, ProgressObserver, RunOutcome, RunStats};
