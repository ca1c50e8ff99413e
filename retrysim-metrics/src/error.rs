//! Error types for derived metrics

use thiserror::Error;

/// Errors from querying collected stats
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("No calls recorded; load is undefined")]
    NoCalls,

    #[error("No latency samples recorded")]
    NoLatencySamples,
}
