//! Client, server and retry-policy models for retry amplification studies
//!
//! The model is one open-loop [`Client`] calling one single-concurrency
//! [`Server`]. Every call carries a [`Retrier`] that decides, after each failed
//! attempt, whether the call goes back into the server's queue. The extra
//! attempts are the load amplification the simulation measures.
//!
//! All components run inside a single-threaded simulation, so shared state is
//! held in [`Shared`] (`Rc<RefCell<_>>`) handles captured by event callbacks.
//!
//! # Example
//!
//! ```rust
//! use retrysim_components::{run_scenario, RetryPolicyKind, ScenarioConfig};
//!
//! let config = ScenarioConfig::default()
//!     .with_policy(RetryPolicyKind::Fixed)
//!     .with_failure_rate(1.0)
//!     .with_horizon(30.0);
//! let report = run_scenario(&config).unwrap();
//! assert_eq!(report.load_percent().unwrap(), 400.0);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use retrysim_metrics::StatsRecorder;

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod experiment;
pub mod retry_policy;
pub mod server;
pub mod validate;

pub use call::{Call, CallState};
pub use client::{Client, DrainSwitch};
pub use config::{ClientConfig, RetryConfig, ScenarioConfig, ServerConfig};
pub use error::ComponentError;
pub use experiment::{
    failure_rate_range, run_scenario, sweep_failure_rates, LoadCurve, ScenarioReport,
};
pub use retry_policy::{
    factory_by_name, CircuitBreakerRetrierFactory, CircuitBreakerState, FixedRetrierFactory,
    FixedRetryPolicy, Retrier, RetrierFactory, RetryPolicyKind, TokenBucketPolicy,
    TokenBucketRetrierFactory,
};
pub use server::{Request, Server};
pub use validate::{
    validate_non_empty, validate_non_negative, validate_positive, validate_range, Validate,
    ValidationError, ValidationResult,
};

/// Mutable state shared between event callbacks of one simulation.
pub type Shared<T> = Rc<RefCell<T>>;

/// Stats collaborator as seen by clients and calls.
pub type SharedStats = Rc<RefCell<dyn StatsRecorder>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
