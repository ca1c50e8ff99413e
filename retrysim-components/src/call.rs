//! A client-initiated call and its retry loop
//!
//! A [`Call`] lives from the client's first attempt until it either succeeds
//! or its retrier gives up. Failed attempts are resubmitted to the same server
//! with the same `Call`, so the retrier sees the call's whole attempt history.
//!
//! ```text
//! Pending --success--> Succeeded
//!    |
//!    +--failure--> Retrying --success--> Succeeded
//!    |                |
//!    |                +--failure, retry allowed--> Retrying
//!    |                |
//!    +----------------+--failure, no retry-----> Failed
//! ```

use std::fmt;
use std::rc::Rc;

use retrysim_core::{Event, Payload, SimTime};
use tracing::debug;

use crate::retry_policy::Retrier;
use crate::server::{Request, Server};
use crate::{SharedStats, Shared};

/// Where a call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// First attempt submitted, no outcome yet.
    Pending,
    /// At least one attempt failed and another one was submitted.
    Retrying,
    Succeeded,
    Failed,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded | CallState::Failed)
    }
}

pub struct Call {
    id: u64,
    retrier: Retrier,
    attempts: u32,
    started_at: SimTime,
    state: CallState,
    stats: SharedStats,
    server: Shared<Server>,
}

impl Call {
    /// A call whose first attempt is being submitted at `started_at`.
    pub fn new(
        id: u64,
        mut retrier: Retrier,
        started_at: SimTime,
        stats: SharedStats,
        server: Shared<Server>,
    ) -> Self {
        retrier.init_call();
        Self {
            id,
            retrier,
            attempts: 1,
            started_at,
            state: CallState::Pending,
            stats,
            server,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Attempts submitted so far, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn started_at(&self) -> SimTime {
        self.started_at
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn retrier(&self) -> &Retrier {
        &self.retrier
    }

    /// Event delivering the outcome of `request` to its call at `time`.
    ///
    /// The request travels as the event payload.
    pub fn outcome_event(time: SimTime, request: Request, failed: bool) -> Event {
        let call = Rc::clone(&request.call);
        Event::new(
            time,
            move |now, payload| {
                let request = payload.take::<Request>();
                if failed {
                    Call::on_failure(&call, now, request)
                } else {
                    Call::on_success(&call, now, request)
                }
            },
            Payload::new(request),
        )
    }

    /// The attempt described by `request` succeeded at `time`.
    pub fn on_success(this: &Shared<Call>, time: SimTime, request: Request) -> Vec<Event> {
        let mut call = this.borrow_mut();
        debug_assert!(Rc::ptr_eq(this, &request.call), "outcome delivered to the wrong call");
        debug_assert!(!call.state.is_terminal(), "call {} already finished", call.id);

        call.retrier.record_success();
        call.state = CallState::Succeeded;

        let latency = time.duration_since(call.started_at);
        let mut stats = call.stats.borrow_mut();
        stats.record_success();
        stats.record_latency(latency);

        Vec::new()
    }

    /// The attempt described by `request` failed at `time`. Either resubmits
    /// the call or gives up on it.
    pub fn on_failure(this: &Shared<Call>, time: SimTime, request: Request) -> Vec<Event> {
        let mut call = this.borrow_mut();
        debug_assert!(Rc::ptr_eq(this, &request.call), "outcome delivered to the wrong call");
        debug_assert!(!call.state.is_terminal(), "call {} already finished", call.id);

        call.retrier.record_failure();

        if !call.retrier.should_retry() {
            call.state = CallState::Failed;
            call.stats.borrow_mut().record_failure();
            debug!(
                call = call.id,
                attempts = call.attempts,
                policy = %call.retrier.kind(),
                "Giving up on call"
            );
            return Vec::new();
        }

        call.attempts += 1;
        call.state = CallState::Retrying;
        call.stats.borrow_mut().record_attempt();
        debug!(call = call.id, attempt = call.attempts, "Retrying call");

        let server = Rc::clone(&call.server);
        drop(call);
        Server::send_request(&server, time, Rc::clone(this))
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("policy", &self.retrier.kind())
            .field("attempts", &self.attempts)
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .finish()
    }
}
