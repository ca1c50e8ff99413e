//! Scheduled units of work
//!
//! An [`Event`] couples a trigger time with a one-shot callback and an opaque
//! [`Payload`]. When the scheduler fires the event, the callback receives the
//! event time and the payload and returns the follow-on events it caused.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::EventError;
use crate::SimTime;

/// Callback invoked when an event fires.
pub type Callback = Box<dyn FnOnce(SimTime, Payload) -> Vec<Event>>;

/// Opaque value carried by an event to its callback.
///
/// The scheduler never looks inside. Callbacks recover the concrete value with
/// [`Payload::take`], which treats a type mismatch as a programming error.
pub struct Payload {
    inner: Option<Box<dyn Any>>,
    type_name: &'static str,
}

impl Payload {
    /// A payload carrying nothing.
    pub fn empty() -> Self {
        Self {
            inner: None,
            type_name: "()",
        }
    }

    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Some(Box::new(value)),
            type_name: type_name::<T>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Name of the type stored in the payload, `"()"` when empty.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the stored value, or report what was actually stored.
    pub fn try_take<T: Any>(self) -> Result<T, EventError> {
        let actual = self.type_name;
        let mismatch = || EventError::TypeMismatch {
            expected: type_name::<T>(),
            actual,
        };

        let boxed = self.inner.ok_or_else(mismatch)?;
        boxed.downcast::<T>().map(|value| *value).map_err(|_| mismatch())
    }

    /// Recover the stored value.
    ///
    /// # Panics
    ///
    /// Panics if the payload does not hold a `T`. A callback handed the wrong
    /// payload means events were wired incorrectly, and the run must stop.
    pub fn take<T: Any>(self) -> T {
        match self.try_take() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.type_name).finish()
    }
}

/// A callback scheduled to run at a point on the virtual clock.
///
/// Events are immutable once created and are consumed exactly once.
pub struct Event {
    time: SimTime,
    callback: Callback,
    payload: Payload,
}

impl Event {
    pub fn new<F>(time: SimTime, callback: F, payload: Payload) -> Self
    where
        F: FnOnce(SimTime, Payload) -> Vec<Event> + 'static,
    {
        Self {
            time,
            callback: Box::new(callback),
            payload,
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Drop the callback without running it and keep the payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Run the callback, returning the events it produced.
    pub fn fire(self) -> Vec<Event> {
        (self.callback)(self.time, self.payload)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
