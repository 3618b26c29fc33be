//! # Metrics Publisher
//!
//! Fire-and-forget delivery and skip metrics for the availability check.
//! Publishing failures are logged and swallowed; nothing here may ever
//! abort the main notification flow.

/// Metrics sink trait, the CloudWatch implementation and a log-only sink.
mod publisher;

pub use publisher::{CloudWatchMetrics, LogMetrics, MetricsSink};
