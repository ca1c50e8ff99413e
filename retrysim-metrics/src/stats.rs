//! Per-run call statistics
//!
//! Counts are kept locally for the derived queries and also forwarded to the
//! `metrics` facade. Without an installed recorder the forwarding is a no-op.

use std::time::Duration;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::trace;

use crate::error::MetricsError;

/// Receives everything the client and server model reports about calls.
pub trait StatsRecorder {
    /// A unique, client-initiated call was created.
    fn record_call(&mut self);

    /// A request attempt was submitted to the server, first try or retry.
    fn record_attempt(&mut self);

    /// End-to-end latency of a call that eventually succeeded.
    fn record_latency(&mut self, latency: Duration);

    fn record_success(&mut self);

    /// A call gave up after its final failed attempt.
    fn record_failure(&mut self);
}

/// Counters and latency samples for one simulation run.
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    label: String,
    unique_calls: u64,
    attempts: u64,
    successes: u64,
    failures: u64,
    latencies: Vec<Duration>,
}

impl SimulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats whose mirrored metrics carry `scenario = label`.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn unique_calls(&self) -> u64 {
        self.unique_calls
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Latency samples in the order calls completed.
    pub fn latencies(&self) -> &[Duration] {
        &self.latencies
    }

    /// Attempts per unique call, as a percentage. 100 means no retries.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::NoCalls`] if no call was recorded.
    pub fn load_percent(&self) -> Result<f64, MetricsError> {
        if self.unique_calls == 0 {
            return Err(MetricsError::NoCalls);
        }
        Ok(self.attempts as f64 / self.unique_calls as f64 * 100.0)
    }

    /// # Errors
    ///
    /// Returns [`MetricsError::NoLatencySamples`] if no call succeeded.
    pub fn mean_latency(&self) -> Result<Duration, MetricsError> {
        if self.latencies.is_empty() {
            return Err(MetricsError::NoLatencySamples);
        }
        let total: Duration = self.latencies.iter().sum();
        Ok(total / self.latencies.len() as u32)
    }

    /// Point-in-time copy of the counts and derived metrics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            unique_calls: self.unique_calls,
            attempts: self.attempts,
            successes: self.successes,
            failures: self.failures,
            latency_samples: self.latencies.len(),
            load_percent: self.load_percent().ok(),
            mean_latency_secs: self.mean_latency().ok().map(|d| d.as_secs_f64()),
        }
    }
}

impl StatsRecorder for SimulationStats {
    fn record_call(&mut self) {
        self.unique_calls += 1;
        counter!("retrysim_calls_total", "scenario" => self.label.clone()).increment(1);
    }

    fn record_attempt(&mut self) {
        self.attempts += 1;
        counter!("retrysim_attempts_total", "scenario" => self.label.clone()).increment(1);
    }

    fn record_latency(&mut self, latency: Duration) {
        trace!(latency_secs = latency.as_secs_f64(), "Latency recorded");
        self.latencies.push(latency);
        histogram!("retrysim_call_latency_seconds", "scenario" => self.label.clone())
            .record(latency.as_secs_f64());
    }

    fn record_success(&mut self) {
        self.successes += 1;
        counter!("retrysim_successes_total", "scenario" => self.label.clone()).increment(1);
    }

    fn record_failure(&mut self) {
        self.failures += 1;
        counter!("retrysim_failures_total", "scenario" => self.label.clone()).increment(1);
    }
}

/// Serializable summary of [`SimulationStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub unique_calls: u64,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub latency_samples: usize,
    /// `None` when no call was recorded.
    pub load_percent: Option<f64>,
    /// `None` when no call succeeded.
    pub mean_latency_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = SimulationStats::new();
        assert_eq!(stats.load_percent(), Err(MetricsError::NoCalls));
        assert_eq!(stats.mean_latency(), Err(MetricsError::NoLatencySamples));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.unique_calls, 0);
        assert_eq!(snapshot.load_percent, None);
        assert_eq!(snapshot.mean_latency_secs, None);
    }

    #[test]
    fn test_load_counts_retries() {
        let mut stats = SimulationStats::with_label("load");
        for _ in 0..4 {
            stats.record_call();
            stats.record_attempt();
        }
        // Two of the calls were retried once more.
        stats.record_attempt();
        stats.record_attempt();

        assert_eq!(stats.unique_calls(), 4);
        assert_eq!(stats.attempts(), 6);
        assert_eq!(stats.load_percent(), Ok(150.0));
        assert_eq!(stats.label(), "load");
    }

    #[test]
    fn test_mean_latency() {
        let mut stats = SimulationStats::new();
        stats.record_latency(Duration::from_millis(400));
        stats.record_latency(Duration::from_millis(600));
        stats.record_success();
        stats.record_success();
        stats.record_failure();

        assert_eq!(stats.mean_latency(), Ok(Duration::from_millis(500)));
        assert_eq!(stats.latencies().len(), 2);
        assert_eq!(stats.successes(), 2);
        assert_eq!(stats.failures(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut stats = SimulationStats::new();
        stats.record_call();
        stats.record_attempt();
        stats.record_latency(Duration::from_millis(250));
        stats.record_success();

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["unique_calls"], 1);
        assert_eq!(json["attempts"], 1);
        assert_eq!(json["load_percent"], 100.0);
        assert_eq!(json["mean_latency_secs"], 0.25);
    }
}
