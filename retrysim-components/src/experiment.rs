//! Scenario runner and failure-rate sweeps
//!
//! [`run_scenario`] wires one client to one server, runs the simulation until
//! the client has drained, and reports what the server saw. Sweeping the
//! server's failure rate for several policies yields the load curves that
//! show how much each policy amplifies traffic as the server degrades.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use retrysim_core::{run, simulation_span, RunSummary, SimTime};
use retrysim_metrics::{MetricsError, SimulationStats, StatsSnapshot};
use serde::Serialize;
use tracing::{debug, info};

use crate::client::Client;
use crate::config::ScenarioConfig;
use crate::error::ComponentError;
use crate::retry_policy::RetryPolicyKind;
use crate::server::Server;
use crate::validate::Validate;
use crate::{shared, SharedStats};

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub policy: RetryPolicyKind,
    pub failure_rate: f64,
    pub seed: u64,
    pub stats: StatsSnapshot,
    pub run: RunSummary,
}

impl ScenarioReport {
    /// # Errors
    ///
    /// Returns [`MetricsError::NoCalls`] if the client never issued a call.
    pub fn load_percent(&self) -> Result<f64, MetricsError> {
        self.stats.load_percent.ok_or(MetricsError::NoCalls)
    }
}

/// Runs a single client against a single server as described by `config`.
///
/// # Errors
///
/// Fails if the configuration is invalid or the simulation itself errors.
pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, ComponentError> {
    config.validate()?;

    let label = format!("{}@{}", config.policy, config.server.failure_rate);
    let span = simulation_span(&label);
    let _guard = span.enter();
    info!(
        seed = config.simulation.seed,
        policy = %config.policy,
        failure_rate = config.server.failure_rate,
        horizon = config.horizon,
        "Scenario started"
    );

    let stats = Rc::new(RefCell::new(SimulationStats::with_label(label)));
    let recorder: SharedStats = stats.clone();

    let server = shared(Server::from_config(&config.server, &config.simulation)?);
    let client = Client::from_config(
        &config.client,
        &config.simulation,
        config.policy.factory(&config.retry),
        Rc::clone(&server),
        recorder,
    )?
    .into_shared();

    let drain = client.borrow().drain_switch();
    let summary = run(
        SimTime::from_secs_f64(config.horizon),
        [Client::gen_load_event(&client, SimTime::zero())],
        move || drain.trip(),
    )?;

    let snapshot = stats.borrow().snapshot();
    info!(
        unique_calls = snapshot.unique_calls,
        attempts = snapshot.attempts,
        successes = snapshot.successes,
        failures = snapshot.failures,
        load_percent = ?snapshot.load_percent,
        final_time = %summary.final_time,
        "Scenario completed"
    );
    debug_assert!(!server.borrow().is_busy(), "server still busy after drain");

    Ok(ScenarioReport {
        policy: config.policy,
        failure_rate: config.server.failure_rate,
        seed: config.simulation.seed,
        stats: snapshot,
        run: summary,
    })
}

/// `start, start + step, ...` up to and including `end`.
///
/// Values are computed as `start + i * step` so rounding errors do not
/// accumulate. Empty if `step` is not positive or `end < start`.
pub fn failure_rate_range(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !(end >= start) {
        return Vec::new();
    }
    // Tolerance so an `end` that is a multiple of `step` is included.
    let count = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Load observed by the server for each policy at each failure rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCurve {
    pub failure_rates: Vec<f64>,
    /// One load percentage per entry of `failure_rates`.
    pub load_by_policy: BTreeMap<RetryPolicyKind, Vec<f64>>,
}

impl LoadCurve {
    pub fn load_for(&self, policy: RetryPolicyKind) -> Option<&[f64]> {
        self.load_by_policy.get(&policy).map(Vec::as_slice)
    }
}

/// Runs `base` once per policy and failure rate.
///
/// Every run uses the seed in `base`, so policies are compared on the same
/// arrival and service-time draws.
///
/// # Errors
///
/// Stops at the first scenario that fails or issues no calls.
pub fn sweep_failure_rates(
    base: &ScenarioConfig,
    policies: &[RetryPolicyKind],
    failure_rates: &[f64],
) -> Result<LoadCurve, ComponentError> {
    let mut load_by_policy = BTreeMap::new();

    for &policy in policies {
        let mut loads = Vec::with_capacity(failure_rates.len());
        for &failure_rate in failure_rates {
            let config = base
                .clone()
                .with_policy(policy)
                .with_failure_rate(failure_rate);
            let report = run_scenario(&config)?;
            let load = report.load_percent()?;
            debug!(%policy, failure_rate, load, "Sweep point");
            loads.push(load);
        }
        load_by_policy.insert(policy, loads);
    }

    Ok(LoadCurve {
        failure_rates: failure_rates.to_vec(),
        load_by_policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate_range() {
        assert_eq!(failure_rate_range(0.0, 1.0, 0.25), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(failure_rate_range(0.0, 1.0, 0.1).len(), 11);
        assert_eq!(failure_rate_range(0.0, 1.0, 0.001).len(), 1001);
        assert_eq!(failure_rate_range(0.5, 0.5, 0.1), vec![0.5]);
        assert!(failure_rate_range(1.0, 0.0, 0.1).is_empty());
        assert!(failure_rate_range(0.0, 1.0, 0.0).is_empty());
        assert!(failure_rate_range(0.0, 1.0, f64::NAN).is_empty());
    }

    #[test]
    fn test_short_scenario_report() {
        let config = ScenarioConfig::default().with_horizon(50.0);
        let report = run_scenario(&config).unwrap();

        assert_eq!(report.policy, RetryPolicyKind::Fixed);
        assert_eq!(report.seed, 1);
        assert!(report.stats.unique_calls >= 45 && report.stats.unique_calls <= 55);
        assert_eq!(report.load_percent(), Ok(100.0));
        assert!(report.run.horizon_reached_at.unwrap() > SimTime::from_secs(50));
        assert!(report.run.final_time >= report.run.horizon_reached_at.unwrap());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_running() {
        let config = ScenarioConfig::default().with_failure_rate(-0.5);
        assert!(matches!(
            run_scenario(&config),
            Err(ComponentError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_out_of_range_timings_are_rejected_before_running() {
        let config = ScenarioConfig::default().with_horizon(1e11);
        assert!(matches!(
            run_scenario(&config),
            Err(ComponentError::InvalidConfiguration(_))
        ));

        let mut config = ScenarioConfig::default();
        config.client.requests_per_second = 1e-300;
        assert!(matches!(
            run_scenario(&config),
            Err(ComponentError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_sweep_shapes_curve() {
        let base = ScenarioConfig::default().with_horizon(20.0);
        let rates = failure_rate_range(0.0, 1.0, 0.5);
        let curve = sweep_failure_rates(
            &base,
            &[RetryPolicyKind::Fixed, RetryPolicyKind::CircuitBreaker],
            &rates,
        )
        .unwrap();

        assert_eq!(curve.failure_rates, rates);
        assert_eq!(curve.load_by_policy.len(), 2);
        let fixed = curve.load_for(RetryPolicyKind::Fixed).unwrap();
        assert_eq!(fixed.len(), 3);
        assert_eq!(fixed[0], 100.0);
        assert_eq!(fixed[2], 400.0);
        assert!(curve.load_for(RetryPolicyKind::TokenBucket).is_none());
    }
}
