use serde::Serialize;

use crate::error::SimError;
use crate::logging::events;
use crate::{SimTime, Simulation};

/// Simulation execution trait.
pub trait Execute {
    /// Executes the simulation until some stopping condition is reached.
    /// The condition is implementation-specific.
    fn execute(self, sim: &mut Simulation) -> Result<RunSummary, SimError>;
}

/// What a finished execution looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Clock value after the last processed event.
    pub final_time: SimTime,
    /// Events the simulation has processed so far.
    pub events_processed: u64,
    /// Clock value at which the horizon hook ran, if it ran.
    pub horizon_reached_at: Option<SimTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCondition {
    NoEvents,
    Steps(usize),
}

/// Executor is used for simple execution of an entire simulation.
///
/// See the crate level documentation for examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    end_condition: EndCondition,
}

impl Executor {
    /// Simulation will end only once there is no available events in the queue.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            end_condition: EndCondition::NoEvents,
        }
    }

    /// Simulation will execute exactly this many steps, unless we run out of events.
    #[must_use]
    pub fn steps(steps: usize) -> Self {
        Self {
            end_condition: EndCondition::Steps(steps),
        }
    }

    /// Adds a drain policy: once the clock has moved past `horizon`, `hook` runs
    /// exactly once.
    ///
    /// The check happens after each processed event, so the first event later
    /// than `horizon` still runs with the hook unfired. The hook is expected to
    /// stop whatever generates new load. If it doesn't, an unbound executor
    /// never returns.
    #[must_use]
    pub fn with_horizon<F>(self, horizon: SimTime, hook: F) -> HorizonExecutor<F>
    where
        F: FnOnce(),
    {
        HorizonExecutor {
            end_condition: self.end_condition,
            horizon,
            hook: Some(hook),
        }
    }
}

impl Execute for Executor {
    fn execute(self, sim: &mut Simulation) -> Result<RunSummary, SimError> {
        run_with(sim, self.end_condition, |_| {})?;
        Ok(sim.summary(None))
    }
}

/// Executor that applies a drain policy at a time horizon.
pub struct HorizonExecutor<F>
where
    F: FnOnce(),
{
    end_condition: EndCondition,
    horizon: SimTime,
    hook: Option<F>,
}

impl<F> Execute for HorizonExecutor<F>
where
    F: FnOnce(),
{
    fn execute(mut self, sim: &mut Simulation) -> Result<RunSummary, SimError> {
        let horizon = self.horizon;
        let mut reached_at = None;
        run_with(sim, self.end_condition, |sim| {
            let now = sim.time();
            if now > horizon {
                if let Some(hook) = self.hook.take() {
                    events::horizon_reached(horizon, now, sim.pending_events());
                    hook();
                    reached_at = Some(now);
                }
            }
        })?;
        Ok(sim.summary(reached_at))
    }
}

fn run_with<F>(
    sim: &mut Simulation,
    end_condition: EndCondition,
    mut after_step: F,
) -> Result<(), SimError>
where
    F: FnMut(&Simulation),
{
    let mut step = |sim: &mut Simulation| -> Result<bool, SimError> {
        let progressed = sim.step()?;
        if progressed {
            after_step(sim);
        }
        Ok(progressed)
    };

    match end_condition {
        EndCondition::NoEvents => {
            while step(sim)? {}
        }
        EndCondition::Steps(steps) => {
            for _ in 0..steps {
                if !step(sim)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::{Event, Payload};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Event that re-schedules itself every two seconds until `limit` firings,
    /// counting how often it ran.
    fn ticker(time: SimTime, counter: Rc<Cell<usize>>, limit: usize) -> Event {
        Event::new(
            time,
            move |now, _| {
                counter.set(counter.get() + 1);
                if counter.get() < limit {
                    vec![ticker(now + Duration::from_secs(2), counter, limit)]
                } else {
                    Vec::new()
                }
            },
            Payload::empty(),
        )
    }

    #[test]
    fn test_create_executor() {
        assert_eq!(
            Executor::unbound(),
            Executor {
                end_condition: EndCondition::NoEvents
            }
        );
        assert_eq!(
            Executor::steps(7),
            Executor {
                end_condition: EndCondition::Steps(7)
            }
        );
    }

    #[test]
    fn test_unbound_runs_until_empty() {
        let mut sim = Simulation::default();
        let counter = Rc::new(Cell::new(0));
        sim.schedule(ticker(SimTime::zero(), counter.clone(), 10)).unwrap();

        let summary = Executor::unbound().execute(&mut sim).unwrap();
        assert_eq!(counter.get(), 10);
        assert_eq!(summary.events_processed, 10);
        assert_eq!(summary.final_time, SimTime::from_secs(18));
        assert_eq!(summary.horizon_reached_at, None);
    }

    #[test]
    fn test_steps() {
        let mut sim = Simulation::default();
        let counter = Rc::new(Cell::new(0));
        sim.schedule(ticker(SimTime::zero(), counter.clone(), usize::MAX)).unwrap();

        Executor::steps(4).execute(&mut sim).unwrap();
        assert_eq!(counter.get(), 4);
        assert_eq!(sim.time(), SimTime::from_secs(6));
        assert_eq!(sim.pending_events(), 1);
    }

    #[test]
    fn test_steps_stops_before() {
        let mut sim = Simulation::default();
        let counter = Rc::new(Cell::new(0));
        sim.schedule(ticker(SimTime::zero(), counter.clone(), 10)).unwrap();

        // After 10 steps there are no events, so it will not execute all 100
        Executor::steps(100).execute(&mut sim).unwrap();
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn test_horizon_hook_fires_once_after_crossing() {
        let mut sim = Simulation::default();
        let counter = Rc::new(Cell::new(0));
        let hook_calls = Rc::new(Cell::new(0));
        sim.schedule(ticker(SimTime::zero(), counter.clone(), 10)).unwrap();

        let calls = hook_calls.clone();
        let summary = Executor::unbound()
            .with_horizon(SimTime::from_secs(5), move || calls.set(calls.get() + 1))
            .execute(&mut sim)
            .unwrap();

        // Ticks land on 0, 2, 4, 6, ...; 6 is the first one past the horizon.
        assert_eq!(hook_calls.get(), 1);
        assert_eq!(summary.horizon_reached_at, Some(SimTime::from_secs(6)));
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn test_horizon_equal_to_event_time_does_not_fire() {
        let mut sim = Simulation::default();
        let counter = Rc::new(Cell::new(0));
        let fired = Rc::new(Cell::new(false));
        sim.schedule(ticker(SimTime::zero(), counter.clone(), 3)).unwrap();

        let flag = fired.clone();
        let summary = Executor::unbound()
            .with_horizon(SimTime::from_secs(4), move || flag.set(true))
            .execute(&mut sim)
            .unwrap();

        assert!(!fired.get());
        assert_eq!(summary.horizon_reached_at, None);
    }
}
