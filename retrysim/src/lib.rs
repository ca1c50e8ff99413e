//! # retrysim - retry amplification simulator
//!
//! A deterministic discrete-event simulation of a client calling a
//! single-concurrency server, used to compare how much extra load different
//! retry policies generate as the server's failure rate rises.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`core`]: virtual clock, events, scheduler and run loop.
//! - [`metrics`]: the stats collaborator and derived metrics.
//! - [`components`]: client, server, retry policies and the scenario runner.
//!
//! ## Example
//!
//! ```rust
//! use retrysim::prelude::*;
//!
//! let base = ScenarioConfig::default().with_horizon(60.0);
//! let curve = sweep_failure_rates(
//!     &base,
//!     &[RetryPolicyKind::Fixed, RetryPolicyKind::TokenBucket],
//!     &failure_rate_range(0.0, 1.0, 0.5),
//! )
//! .unwrap();
//! assert_eq!(curve.load_for(RetryPolicyKind::Fixed).unwrap()[0], 100.0);
//! ```
//!
//! See `examples/retry_load_sweep.rs` for a full sweep.

pub use retrysim_components as components;
pub use retrysim_core as core;
pub use retrysim_metrics as metrics;

// Convenience re-exports of commonly used items
pub mod prelude {
    //! Commonly used types and functions

    pub use retrysim_core::{
        init_simulation_logging, init_simulation_logging_with_level, run, Event, Execute, Executor,
        Payload, RunSummary, SimTime, Simulation, SimulationConfig,
    };

    pub use retrysim_components::{
        failure_rate_range, run_scenario, sweep_failure_rates, Client, ClientConfig, LoadCurve,
        RetryConfig, RetryPolicyKind, ScenarioConfig, ScenarioReport, Server, ServerConfig,
    };

    pub use retrysim_metrics::{SimulationStats, StatsRecorder, StatsSnapshot};
}
