//! Component and scenario configuration
//!
//! All configs deserialize with serde and fill missing fields from `Default`,
//! which reproduces the baseline experiment: one client sending one request
//! per second to one server with a half-second mean service time.

use serde::{Deserialize, Serialize};

use retrysim_core::{SimTime, SimulationConfig};

use crate::retry_policy::RetryPolicyKind;
use crate::validate::{
    validate_at_most, validate_non_empty, validate_non_negative, validate_positive,
    validate_range, Validate, ValidationResult,
};

/// Longest time span, in seconds, that timing parameters may describe.
pub const MAX_SPAN_SECS: f64 = SimTime::MAX_SECS;

/// Finite, non-negative and no longer than the virtual clock can hold.
fn validate_span(field: &str, secs: f64) -> ValidationResult<()> {
    validate_non_negative(field, secs)?;
    validate_at_most(field, secs, MAX_SPAN_SECS)
}

/// Load generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub requests_per_second: f64,
    /// Standard deviation of the inter-arrival delay, in seconds.
    pub inter_arrival_std_dev: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "client".to_string(),
            requests_per_second: 1.0,
            inter_arrival_std_dev: 0.1,
        }
    }
}

impl ClientConfig {
    /// Mean delay between two calls, in seconds.
    pub fn mean_inter_arrival(&self) -> f64 {
        1.0 / self.requests_per_second
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_non_empty("client.name", &self.name)?;
        validate_positive("client.requests_per_second", self.requests_per_second)?;
        validate_span("client.mean_inter_arrival", self.mean_inter_arrival())?;
        validate_span("client.inter_arrival_std_dev", self.inter_arrival_std_dev)
    }
}

/// Single-concurrency server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    /// Mean service time in seconds.
    pub mean_service_time: f64,
    pub service_time_std_dev: f64,
    /// Probability that a processed request fails.
    pub failure_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "server".to_string(),
            mean_service_time: 0.5,
            service_time_std_dev: 0.1,
            failure_rate: 0.0,
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_non_empty("server.name", &self.name)?;
        validate_span("server.mean_service_time", self.mean_service_time)?;
        validate_span("server.service_time_std_dev", self.service_time_std_dev)?;
        validate_range("server.failure_rate", self.failure_rate, 0.0, 1.0)
    }
}

/// Limits shared by the retry policy family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed per call by fixed-attempt policies.
    pub max_attempts: u32,
    /// Failure ratio at which the circuit breaker stops retries.
    pub circuit_breaker_max_rate: f64,
    pub token_bucket_capacity: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            circuit_breaker_max_rate: 0.5,
            token_bucket_capacity: 10,
        }
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive("retry.circuit_breaker_max_rate", self.circuit_breaker_max_rate)
    }
}

/// Everything needed for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub simulation: SimulationConfig,
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub retry: RetryConfig,
    pub policy: RetryPolicyKind,
    /// Virtual time, in seconds, after which the client stops generating load.
    pub horizon: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            client: ClientConfig::default(),
            server: ServerConfig::default(),
            retry: RetryConfig::default(),
            policy: RetryPolicyKind::Fixed,
            horizon: 5000.0,
        }
    }
}

impl ScenarioConfig {
    pub fn with_policy(mut self, policy: RetryPolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.server.failure_rate = failure_rate;
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = seed;
        self
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> ValidationResult<()> {
        self.client.validate()?;
        self.server.validate()?;
        self.retry.validate()?;
        validate_positive("horizon", self.horizon)?;
        validate_at_most("horizon", self.horizon, MAX_SPAN_SECS)
    }
}
