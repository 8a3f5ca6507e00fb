pub mod metrics;
pub mod monitor;

pub use metrics::{IngestMetrics, MetricsSnapshot};
