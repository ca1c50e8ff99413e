use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::error::EventError;
use crate::event::Event;
use crate::types::EventId;
use crate::SimTime;

/// Entry stored in the event queue: the event plus the sequence number it was
/// given on push.
///
/// Entries order by time first and by sequence number second, which turns the
/// binary heap into a stable priority queue: equal-time events come out in the
/// order they went in.
#[derive(Debug)]
pub(crate) struct EventEntry {
    event_id: EventId,
    event: Event,
}

impl EventEntry {
    fn time(&self) -> SimTime {
        self.event.time()
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.event_id == other.event_id
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap
        other
            .time()
            .cmp(&self.time())
            .then_with(|| other.event_id.cmp(&self.event_id))
    }
}

/// Priority queue of events keyed by time.
///
/// `pop` always returns an event whose time is no later than any other queued
/// event; ties are broken first-in, first-out.
#[derive(Debug, Default)]
pub struct EventQueue {
    next_event_id: u64,
    events: BinaryHeap<EventEntry>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `event`, returning the sequence number it was stamped with.
    pub fn push(&mut self, event: Event) -> EventId {
        self.next_event_id += 1;
        let event_id = EventId(self.next_event_id);
        self.events.push(EventEntry { event_id, event });
        event_id
    }

    /// Removes and returns the earliest event, or `None` if the queue is empty.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop().map(|entry| entry.event)
    }

    /// Time of the earliest queued event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.events.peek().map(EventEntry::time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<Event> for EventQueue {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}

/// Scheduler keeps the virtual clock and the queue of upcoming events.
///
/// See the [crate-level documentation](index.html) for more information.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: EventQueue,
    clock: SimTime,
}

impl Scheduler {
    /// Queues `event` at its own absolute time.
    ///
    /// Events earlier than the current clock are rejected: firing them would
    /// move the clock backwards.
    pub fn schedule(&mut self, event: Event) -> Result<EventId, EventError> {
        let now = self.time();
        if event.time() < now {
            return Err(EventError::ScheduleInPast {
                event_time: event.time(),
                now,
            });
        }

        let event_time = event.time();
        let event_id = self.queue.push(event);
        trace!(event_id = %event_id, time = %event_time, "Event scheduled");
        Ok(event_id)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock
    }

    /// Time of the next scheduled event or `None` if none are left.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek_time()
    }

    /// Removes and returns the next scheduled event, advancing the clock to its
    /// time.
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.queue.pop()?;
        self.clock = event.time();
        Some(event)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::Payload;

    fn tagged(time: SimTime, tag: u32) -> Event {
        Event::new(time, |_, _| Vec::new(), Payload::new(tag))
    }

    fn tag_of(event: Event) -> u32 {
        event.into_payload().take::<u32>()
    }

    #[test]
    fn test_queue_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(tagged(SimTime::from_secs(2), 2));
        queue.push(tagged(SimTime::from_secs(0), 0));
        queue.push(tagged(SimTime::from_secs(1), 1));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_time(), Some(SimTime::zero()));

        let order: Vec<u32> = std::iter::from_fn(|| queue.pop()).map(tag_of).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_breaks_ties_fifo() {
        let mut queue = EventQueue::new();
        let at = SimTime::from_millis(500);
        for tag in 0..50 {
            queue.push(tagged(at, tag));
        }
        queue.push(tagged(SimTime::from_millis(100), 99));

        assert_eq!(queue.pop().map(tag_of), Some(99));
        let order: Vec<u32> = std::iter::from_fn(|| queue.pop()).map(tag_of).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_event_ids_increase() {
        let mut queue = EventQueue::new();
        let first = queue.push(tagged(SimTime::zero(), 0));
        let second = queue.push(tagged(SimTime::zero(), 1));
        assert!(first < second);
    }

    #[test]
    fn test_scheduler_advances_clock() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.time(), SimTime::zero());

        scheduler.schedule(tagged(SimTime::from_secs(2), 2)).unwrap();
        scheduler.schedule(tagged(SimTime::from_secs(1), 1)).unwrap();
        assert_eq!(scheduler.pending_events(), 2);
        assert_eq!(scheduler.peek_time(), Some(SimTime::from_secs(1)));

        let event = scheduler.pop().unwrap();
        assert_eq!(event.time(), SimTime::from_secs(1));
        assert_eq!(scheduler.time(), SimTime::from_secs(1));
        // Peeking does not move the clock.
        assert_eq!(scheduler.peek_time(), Some(SimTime::from_secs(2)));
        assert_eq!(scheduler.time(), SimTime::from_secs(1));

        scheduler.pop().unwrap();
        assert!(scheduler.pop().is_none());
        assert_eq!(scheduler.time(), SimTime::from_secs(2));
    }

    #[test]
    fn test_scheduler_rejects_past_events() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(tagged(SimTime::from_secs(5), 0)).unwrap();
        scheduler.pop().unwrap();

        let err = scheduler
            .schedule(tagged(SimTime::from_secs(4), 1))
            .unwrap_err();
        assert!(matches!(err, EventError::ScheduleInPast { .. }));

        // Same instant is allowed
        assert!(scheduler.schedule(tagged(SimTime::from_secs(5), 2)).is_ok());
    }
}
