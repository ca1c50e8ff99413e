//! Open-loop load generator
//!
//! A [`Client`] issues calls at sampled intervals by rescheduling its own
//! load-generation event, until its [`DrainSwitch`] is tripped. Each call gets
//! its retrier from the client's [`RetrierFactory`].

use std::cell::Cell;
use std::rc::Rc;

use retrysim_core::dists::{ArrivalPattern, FoldedNormal};
use retrysim_core::{DrawSite, Event, Payload, SimError, SimTime, SimulationConfig};
use tracing::{debug, trace};

use crate::call::Call;
use crate::config::ClientConfig;
use crate::retry_policy::RetrierFactory;
use crate::server::Server;
use crate::{shared, Shared, SharedStats};

const INTER_ARRIVAL_SITE: DrawSite = DrawSite::named("client.inter_arrival");

/// Cooperative stop signal for a client's load generation.
///
/// Clones share the same flag. Tripping it only stops new calls; attempts
/// already in flight run to completion.
#[derive(Debug, Clone, Default)]
pub struct DrainSwitch(Rc<Cell<bool>>);

impl DrainSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.0.set(true);
    }

    pub fn is_tripped(&self) -> bool {
        self.0.get()
    }
}

pub struct Client {
    name: String,
    inter_arrival: Box<dyn ArrivalPattern>,
    retriers: Box<dyn RetrierFactory>,
    server: Shared<Server>,
    stats: SharedStats,
    drain: DrainSwitch,
    calls_issued: u64,
}

impl Client {
    pub fn new(
        name: impl Into<String>,
        inter_arrival: Box<dyn ArrivalPattern>,
        retriers: Box<dyn RetrierFactory>,
        server: Shared<Server>,
        stats: SharedStats,
    ) -> Self {
        Self {
            name: name.into(),
            inter_arrival,
            retriers,
            server,
            stats,
            drain: DrainSwitch::new(),
            calls_issued: 0,
        }
    }

    /// Builds a client whose inter-arrival delays follow a folded normal
    /// around `1 / requests_per_second`.
    pub fn from_config(
        config: &ClientConfig,
        simulation: &SimulationConfig,
        retriers: Box<dyn RetrierFactory>,
        server: Shared<Server>,
        stats: SharedStats,
    ) -> Result<Self, SimError> {
        let inter_arrival = FoldedNormal::from_config(
            simulation,
            INTER_ARRIVAL_SITE,
            config.mean_inter_arrival(),
            config.inter_arrival_std_dev,
        )?;
        Ok(Self::new(
            config.name.clone(),
            Box::new(inter_arrival),
            retriers,
            server,
            stats,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calls_issued(&self) -> u64 {
        self.calls_issued
    }

    /// Handle on this client's drain flag.
    pub fn drain_switch(&self) -> DrainSwitch {
        self.drain.clone()
    }

    pub fn into_shared(self) -> Shared<Client> {
        shared(self)
    }

    /// Event that runs [`Client::gen_load`] at `time`.
    pub fn gen_load_event(this: &Shared<Client>, time: SimTime) -> Event {
        let client = Rc::clone(this);
        Event::new(
            time,
            move |now, _| Client::gen_load(&client, now),
            Payload::empty(),
        )
    }

    /// Issues a call now and schedules the next load-generation step, or
    /// does nothing once drained.
    pub fn gen_load(this: &Shared<Client>, time: SimTime) -> Vec<Event> {
        let mut client = this.borrow_mut();
        if client.drain.is_tripped() {
            debug!(client = %client.name, calls = client.calls_issued, "Load generation drained");
            return Vec::new();
        }

        let delay = client.inter_arrival.next_arrival_time();
        drop(client);

        vec![
            Self::call_event(this, time),
            Self::gen_load_event(this, time + delay),
        ]
    }

    fn call_event(this: &Shared<Client>, time: SimTime) -> Event {
        let client = Rc::clone(this);
        Event::new(time, move |now, _| Client::call(&client, now), Payload::empty())
    }

    /// Starts a new call and submits its first attempt.
    pub fn call(this: &Shared<Client>, time: SimTime) -> Vec<Event> {
        let mut client = this.borrow_mut();
        client.calls_issued += 1;
        {
            let mut stats = client.stats.borrow_mut();
            stats.record_call();
            stats.record_attempt();
        }

        let retrier = client.retriers.get();
        let call = Call::new(
            client.calls_issued,
            retrier,
            time,
            Rc::clone(&client.stats),
            Rc::clone(&client.server),
        );
        trace!(client = %client.name, call = call.id(), "Call issued");

        let server = Rc::clone(&client.server);
        drop(client);
        Server::send_request(&server, time, shared(call))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.name)
            .field("policy", &self.retriers.kind())
            .field("calls_issued", &self.calls_issued)
            .field("drained", &self.drain.is_tripped())
            .finish()
    }
}
