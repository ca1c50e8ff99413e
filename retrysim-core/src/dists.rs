//! Distribution traits and implementations for arrival patterns, service times
//! and failure injection
//!
//! The stochastic models in this crate all draw from a folded normal
//! distribution: a normal sample with the sign dropped. Constant variants are
//! provided for runs that need exact timings.

use std::time::Duration;

use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::SimError;
use crate::randomness::{DrawSite, SimulationConfig};

/// Trait for generating arrival patterns
///
/// Returns the virtual time to wait before the next arrival.
pub trait ArrivalPattern {
    fn next_arrival_time(&mut self) -> Duration;
}

/// Trait for sampling service times from a distribution
pub trait ServiceTimeDistribution {
    fn sample(&mut self) -> Duration;
}

/// Simple constant arrival pattern
#[derive(Debug, Clone)]
pub struct ConstantArrivalPattern {
    inter_arrival_time: Duration,
}

impl ConstantArrivalPattern {
    pub fn new(inter_arrival_time: Duration) -> Self {
        Self { inter_arrival_time }
    }
}

impl ArrivalPattern for ConstantArrivalPattern {
    fn next_arrival_time(&mut self) -> Duration {
        self.inter_arrival_time
    }
}

/// Constant service time distribution
#[derive(Debug, Clone)]
pub struct ConstantServiceTime {
    duration: Duration,
}

impl ConstantServiceTime {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl ServiceTimeDistribution for ConstantServiceTime {
    fn sample(&mut self) -> Duration {
        self.duration
    }
}

/// Folded normal distribution: `|X|` with `X ~ N(mean, std_dev)`, in seconds.
///
/// Used both for client inter-arrival delays and for server service times.
#[derive(Debug, Clone)]
pub struct FoldedNormal {
    mean: f64,
    std_dev: f64,
    rng: StdRng,
    normal: Normal<f64>,
}

impl FoldedNormal {
    /// # Errors
    ///
    /// Returns `SimError::Configuration` if `mean` is not finite or `std_dev` is
    /// negative or not finite.
    pub fn new(mean: f64, std_dev: f64, rng: StdRng) -> Result<Self, SimError> {
        if !mean.is_finite() {
            return Err(SimError::Configuration(format!(
                "folded normal mean must be finite, got {mean}"
            )));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(SimError::Configuration(format!(
                "folded normal std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        let normal = Normal::new(mean, std_dev)
            .map_err(|err| SimError::Configuration(format!("folded normal: {err}")))?;

        Ok(Self {
            mean,
            std_dev,
            rng,
            normal,
        })
    }

    /// Builds the distribution on the generator `config` assigns to `site`.
    pub fn from_config(
        config: &SimulationConfig,
        site: DrawSite,
        mean: f64,
        std_dev: f64,
    ) -> Result<Self, SimError> {
        Self::new(mean, std_dev, config.rng_for(site))
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Draws one value in seconds; never negative.
    pub fn sample_secs(&mut self) -> f64 {
        self.normal.sample(&mut self.rng).abs()
    }

    /// Draws one value as a delay, saturating at `Duration::MAX`.
    pub fn sample_duration(&mut self) -> Duration {
        Duration::try_from_secs_f64(self.sample_secs()).unwrap_or(Duration::MAX)
    }
}

impl ArrivalPattern for FoldedNormal {
    fn next_arrival_time(&mut self) -> Duration {
        self.sample_duration()
    }
}

impl ServiceTimeDistribution for FoldedNormal {
    fn sample(&mut self) -> Duration {
        self.sample_duration()
    }
}

/// Bernoulli trial deciding whether a request fails.
#[derive(Debug, Clone)]
pub struct FailureInjector {
    failure_rate: f64,
    rng: StdRng,
    trial: Bernoulli,
}

impl FailureInjector {
    /// # Errors
    ///
    /// Returns `SimError::Configuration` unless `failure_rate` is in `[0, 1]`.
    pub fn new(failure_rate: f64, rng: StdRng) -> Result<Self, SimError> {
        let trial = Bernoulli::new(failure_rate).map_err(|err| {
            SimError::Configuration(format!(
                "failure rate must be within [0, 1], got {failure_rate}: {err}"
            ))
        })?;

        Ok(Self {
            failure_rate,
            rng,
            trial,
        })
    }

    pub fn from_config(
        config: &SimulationConfig,
        site: DrawSite,
        failure_rate: f64,
    ) -> Result<Self, SimError> {
        Self::new(failure_rate, config.rng_for(site))
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// `true` with probability `failure_rate`.
    pub fn should_fail(&mut self) -> bool {
        self.trial.sample(&mut self.rng)
    }
}
