//! Stats collection for retry simulations
//!
//! Components report what happens to each call through the [`StatsRecorder`]
//! trait. [`SimulationStats`] keeps the raw counts and latency samples for the
//! derived metrics a report needs (load, mean latency) and mirrors every record
//! into the `metrics` facade, so an installed exporter sees the same numbers.

pub mod error;
pub mod stats;

pub use error::MetricsError;
pub use stats::{SimulationStats, StatsRecorder, StatsSnapshot};
