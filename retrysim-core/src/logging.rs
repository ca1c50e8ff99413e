//! Structured logging for retry simulations
//!
//! # Controlling terminal output
//!
//! ```rust,no_run
//! use retrysim_core::init_simulation_logging_with_level;
//! init_simulation_logging_with_level("debug");
//! ```
//!
//! `RUST_LOG` takes precedence over the level passed in:
//!
//! ```bash
//! RUST_LOG=retrysim_core::scheduler=trace cargo run --example retry_load_sweep
//! RUST_LOG=retrysim_components=debug cargo run --example retry_load_sweep
//! ```
//!
//! Level guidelines:
//! - **TRACE**: every event scheduled and processed (very verbose)
//! - **DEBUG**: component decisions: retries, give-ups, drain
//! - **INFO**: run boundaries, seeds, horizon crossings
//! - **WARN**/**ERROR**: conditions that may affect simulation correctness

use crate::SimTime;
use tracing::{info, Span};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the simulation at `info`.
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info")
}

/// Initialize logging with a specific level
///
/// # Arguments
/// * `level` - Log level: "trace", "debug", "info", "warn", or "error"
///
/// Does nothing if a global subscriber is already installed.
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{level},retrysim_core::scheduler=info,retrysim_components={level}"
        )
        .into()
    });

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if installed.is_ok() {
        info!("Simulation logging initialized at level: {}", level);
    }
}

/// Initialize logging with everything enabled and pretty-printed output.
pub fn init_detailed_simulation_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trace,retrysim_core=trace,retrysim_components=trace".into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .with(filter)
        .try_init();

    if installed.is_ok() {
        info!("Detailed simulation logging initialized");
    }
}

/// Create a span for tracking one simulation run
pub fn simulation_span(name: &str) -> Span {
    tracing::info_span!("simulation", name = name)
}

/// Logging helpers for run-level milestones
pub mod events {
    use super::*;

    pub fn simulation_started(horizon: Option<SimTime>, initial_events: usize) {
        match horizon {
            Some(horizon) => info!(
                horizon = %horizon,
                initial_events,
                "Simulation started"
            ),
            None => info!(initial_events, "Simulation started (unbounded)"),
        }
    }

    pub fn simulation_completed(final_time: SimTime, events_processed: u64) {
        info!(
            final_time = %final_time,
            events_processed,
            "Simulation completed"
        );
    }

    pub fn horizon_reached(horizon: SimTime, now: SimTime, pending_events: usize) {
        info!(
            horizon = %horizon,
            now = %now,
            pending_events,
            "Horizon reached, draining"
        );
    }
}
