//! Single-concurrency server with a FIFO backlog
//!
//! The server serves one request at a time. Arrivals while it is busy wait in
//! `pending`. Each served request takes a sampled service time and then either
//! succeeds or fails according to the server's failure rate; the outcome is
//! delivered back to the owning [`Call`] as an event at the completion time.

use std::collections::VecDeque;
use std::rc::Rc;

use retrysim_core::dists::{FailureInjector, FoldedNormal, ServiceTimeDistribution};
use retrysim_core::{DrawSite, Event, Payload, SimError, SimTime, SimulationConfig};
use tracing::trace;

use crate::call::Call;
use crate::config::ServerConfig;
use crate::Shared;

const SERVICE_TIME_SITE: DrawSite = DrawSite::named("server.service_time");
const FAILURE_SITE: DrawSite = DrawSite::named("server.failure");

/// One attempt of a call, waiting for or in service.
#[derive(Debug)]
pub struct Request {
    /// When this attempt reached the server.
    pub arrived_at: SimTime,
    pub call: Shared<Call>,
}

pub struct Server {
    name: String,
    pending: VecDeque<Request>,
    busy: bool,
    service_time: Box<dyn ServiceTimeDistribution>,
    failures: FailureInjector,
    requests_served: u64,
    requests_failed: u64,
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        service_time: Box<dyn ServiceTimeDistribution>,
        failures: FailureInjector,
    ) -> Self {
        Self {
            name: name.into(),
            pending: VecDeque::new(),
            busy: false,
            service_time,
            failures,
            requests_served: 0,
            requests_failed: 0,
        }
    }

    /// Builds a server with folded-normal service times drawn from the run's seed.
    pub fn from_config(
        config: &ServerConfig,
        simulation: &SimulationConfig,
    ) -> Result<Self, SimError> {
        let service_time = FoldedNormal::from_config(
            simulation,
            SERVICE_TIME_SITE,
            config.mean_service_time,
            config.service_time_std_dev,
        )?;
        let failures = FailureInjector::from_config(simulation, FAILURE_SITE, config.failure_rate)?;
        Ok(Self::new(config.name.clone(), Box::new(service_time), failures))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True from the moment processing is scheduled until a processing step
    /// finds the backlog empty.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed
    }

    /// Queues an attempt of `call`. An idle server is marked busy and starts
    /// processing at `time`; a busy one picks the request up once it finishes
    /// the work ahead of it.
    pub fn send_request(this: &Shared<Server>, time: SimTime, call: Shared<Call>) -> Vec<Event> {
        let mut server = this.borrow_mut();
        server.pending.push_back(Request {
            arrived_at: time,
            call,
        });
        trace!(server = %server.name, pending = server.pending.len(), "Request queued");

        if server.busy {
            return Vec::new();
        }
        server.busy = true;
        vec![Self::process_event(this, time)]
    }

    /// Event that runs [`Server::process_request`] at `time`.
    pub fn process_event(this: &Shared<Server>, time: SimTime) -> Event {
        let server = Rc::clone(this);
        Event::new(
            time,
            move |now, _| Server::process_request(&server, now),
            Payload::empty(),
        )
    }

    /// Serves the head of the backlog.
    ///
    /// Returns the outcome event for the served call followed by the next
    /// processing step, both at the completion time. With nothing to serve the
    /// server goes idle and no events are produced.
    pub fn process_request(this: &Shared<Server>, time: SimTime) -> Vec<Event> {
        let mut server = this.borrow_mut();
        let Some(request) = server.pending.pop_front() else {
            server.busy = false;
            trace!(server = %server.name, "Server idle");
            return Vec::new();
        };

        server.busy = true;
        let completion = time + server.service_time.sample();
        let failed = server.failures.should_fail();
        server.requests_served += 1;
        if failed {
            server.requests_failed += 1;
        }
        trace!(
            server = %server.name,
            queued_for = ?time.duration_since(request.arrived_at),
            completion = %completion,
            failed,
            "Request in service"
        );
        drop(server);

        vec![
            Call::outcome_event(completion, request, failed),
            Self::process_event(this, completion),
        ]
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.name)
            .field("pending", &self.pending.len())
            .field("busy", &self.busy)
            .field("requests_served", &self.requests_served)
            .field("requests_failed", &self.requests_failed)
            .finish()
    }
}

