//! Error types for simulation components

use retrysim_core::SimError;
use retrysim_metrics::MetricsError;
use thiserror::Error;

use crate::validate::ValidationError;

/// Errors raised while building or running a scenario
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error(
        "Unknown retry policy '{0}' \
         (expected one of: fixed, circuit-breaker, token-bucket, token-bucket-fixed)"
    )]
    UnknownRetryPolicy(String),

    #[error("Invalid component configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimError),

    #[error("Metrics unavailable: {0}")]
    Metrics(#[from] MetricsError),
}
