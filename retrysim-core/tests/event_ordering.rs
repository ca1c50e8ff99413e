//! Ordering guarantees of the event queue
//!
//! Events come out in non-decreasing time order no matter how they went in,
//! and events sharing a timestamp come out in insertion order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retrysim_core::{Event, EventQueue, Payload, SimTime};
use std::time::Duration;

fn tagged(time: SimTime, tag: usize) -> Event {
    Event::new(time, |_, _| Vec::new(), Payload::new(tag))
}

fn drain(queue: &mut EventQueue) -> Vec<(SimTime, usize)> {
    let mut popped = Vec::new();
    while let Some(event) = queue.pop() {
        let time = event.time();
        popped.push((time, event.into_payload().take::<usize>()));
    }
    popped
}

#[test]
fn random_insertions_pop_in_time_order() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut queue = EventQueue::new();
        let count = rng.gen_range(1..500);
        for tag in 0..count {
            queue.push(tagged(SimTime::from_millis(rng.gen_range(0..1_000)), tag));
        }

        let popped = drain(&mut queue);
        assert_eq!(popped.len(), count);
        assert!(queue.is_empty());
        for pair in popped.windows(2) {
            assert!(
                pair[0].0 <= pair[1].0,
                "seed {seed}: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn equal_times_pop_in_insertion_order() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut queue = EventQueue::new();
        // Few distinct timestamps so ties are common.
        for tag in 0..300 {
            queue.push(tagged(SimTime::from_secs(rng.gen_range(0..5)), tag));
        }

        let popped = drain(&mut queue);
        for pair in popped.windows(2) {
            if pair[0].0 == pair[1].0 {
                assert!(pair[0].1 < pair[1].1, "seed {seed}: tie broken out of order");
            }
        }
    }
}

#[test]
fn interleaved_push_and_pop_keeps_order_and_length() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut queue = EventQueue::new();
    let mut now = SimTime::zero();
    let mut last_popped = SimTime::zero();
    let mut pushes = 0usize;
    let mut pops = 0usize;

    for _ in 0..2_000 {
        if queue.is_empty() || rng.gen_bool(0.6) {
            let at = now + Duration::from_millis(rng.gen_range(0..50));
            queue.push(tagged(at, pushes));
            pushes += 1;
        } else {
            let event = queue.pop().unwrap();
            pops += 1;
            assert!(event.time() >= last_popped);
            last_popped = event.time();
            now = event.time();
        }
        assert_eq!(queue.len(), pushes - pops);
        assert_eq!(queue.is_empty(), pushes == pops);
    }

    let remaining = drain(&mut queue).len();
    assert_eq!(pops + remaining, pushes);
    assert_eq!(queue.len(), 0);
}
