//! Core discrete event simulation engine for retry studies.
//!
//! The engine is a virtual clock driven by a priority queue of [`Event`]s. Each
//! event carries a one-shot callback; firing it may produce any number of
//! follow-on events, which go back into the queue. Nothing ever sleeps: waiting
//! is expressed as distance on the virtual clock.
//!
//! # Architecture Overview
//!
//! - [`EventQueue`]: min-priority queue of events keyed by time, FIFO among ties.
//! - [`Scheduler`]: the queue plus the virtual clock.
//! - [`Simulation`]: owns a scheduler and steps it one event at a time.
//! - [`Executor`]: decides when a run stops, optionally applying a drain policy
//!   at a time horizon.
//! - [`run`]: the one-call entry point combining all of the above.
//!
//! # Basic Usage
//!
//! ```rust
//! use retrysim_core::{run, Event, Payload, SimTime};
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! fn tick(time: SimTime, stop: Rc<Cell<bool>>) -> Event {
//!     Event::new(
//!         time,
//!         move |now, _| {
//!             if stop.get() {
//!                 return Vec::new();
//!             }
//!             vec![tick(now + Duration::from_secs(1), stop)]
//!         },
//!         Payload::empty(),
//!     )
//! }
//!
//! let stop = Rc::new(Cell::new(false));
//! let drain = Rc::clone(&stop);
//! let summary = run(
//!     SimTime::from_secs(10),
//!     vec![tick(SimTime::zero(), Rc::clone(&stop))],
//!     move || drain.set(true),
//! )
//! .unwrap();
//! assert_eq!(summary.horizon_reached_at, Some(SimTime::from_secs(11)));
//! ```
//!
//! # Time Model
//!
//! All timing uses [`SimTime`], which represents simulation time (not wall-clock time).
//! This ensures deterministic, reproducible behavior across simulation runs.

pub mod dists;
pub mod error;
pub mod event;
pub mod execute;
pub mod logging;
pub mod randomness;
pub mod scheduler;
pub mod time;
pub mod types;

use tracing::{instrument, trace};

pub use error::{EventError, SimError};
pub use event::{Callback, Event, Payload};
pub use execute::{Execute, Executor, HorizonExecutor, RunSummary};
pub use logging::{
    init_detailed_simulation_logging, init_simulation_logging, init_simulation_logging_with_level,
    simulation_span,
};
pub use randomness::{DrawSite, SimulationConfig};
pub use scheduler::{EventQueue, Scheduler};
pub use time::SimTime;
pub use types::EventId;

/// Simulation struct that puts the scheduler and the run loop together.
///
/// See the [crate-level documentation](index.html) for more information.
#[derive(Debug, Default)]
pub struct Simulation {
    scheduler: Scheduler,
    events_processed: u64,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    /// Queues an event at its own time.
    pub fn schedule(&mut self, event: Event) -> Result<EventId, SimError> {
        Ok(self.scheduler.schedule(event)?)
    }

    /// Returns the time of the next scheduled event, or None if no events are scheduled.
    pub fn peek_next_event_time(&self) -> Option<SimTime> {
        self.scheduler.peek_time()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.pending_events()
    }

    pub fn has_pending_events(&self) -> bool {
        self.pending_events() > 0
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Performs one step of the simulation: pops the earliest event, advances
    /// the clock to it, fires its callback and queues whatever it produced.
    ///
    /// Returns `true` if there was in fact an event available to process, and
    /// `false` otherwise, which signifies that the simulation ended.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Some(event) = self.scheduler.pop() else {
            return Ok(false);
        };

        trace!(
            event_time = %event.time(),
            payload = event.payload().type_name(),
            "Processing simulation step"
        );

        let follow_ups = event.fire();
        self.events_processed += 1;
        for follow_up in follow_ups {
            self.scheduler.schedule(follow_up)?;
        }
        Ok(true)
    }

    /// Runs the simulation.
    ///
    /// The stopping condition and other execution details depend on the executor used.
    /// See [`Execute`] and [`Executor`] for more details.
    #[instrument(skip(self, executor), fields(initial_time = %self.time()))]
    pub fn execute<E: Execute>(&mut self, executor: E) -> Result<RunSummary, SimError> {
        let summary = executor.execute(self)?;
        logging::events::simulation_completed(summary.final_time, summary.events_processed);
        Ok(summary)
    }

    pub(crate) fn summary(&self, horizon_reached_at: Option<SimTime>) -> RunSummary {
        RunSummary {
            final_time: self.time(),
            events_processed: self.events_processed,
            horizon_reached_at,
        }
    }
}

/// Runs a simulation to completion.
///
/// Seeds the queue with `initial_events`, then processes events in time order
/// until the queue is empty. The first time the clock passes `horizon`,
/// `on_horizon_reached` runs once; it should switch off load generation so the
/// remaining in-flight events can drain.
///
/// If `on_horizon_reached` does not stop the producers, this never returns.
pub fn run<I, F>(
    horizon: SimTime,
    initial_events: I,
    on_horizon_reached: F,
) -> Result<RunSummary, SimError>
where
    I: IntoIterator<Item = Event>,
    F: FnOnce(),
{
    let mut simulation = Simulation::new();
    for event in initial_events {
        simulation.schedule(event)?;
    }
    logging::events::simulation_started(Some(horizon), simulation.pending_events());

    simulation.execute(Executor::unbound().with_horizon(horizon, on_horizon_reached))
}
