//! Core identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number stamped on every event as it enters the queue.
///
/// Ids grow monotonically, so among events with equal times the smaller id was
/// scheduled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({})", self.0)
    }
}
