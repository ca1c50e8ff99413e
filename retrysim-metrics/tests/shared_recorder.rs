//! Stats shared between several reporters through the recorder trait

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use retrysim_metrics::{MetricsError, SimulationStats, StatsRecorder};

fn report_call(
    recorder: &Rc<RefCell<dyn StatsRecorder>>,
    attempts: u32,
    latency: Option<Duration>,
) {
    let mut recorder = recorder.borrow_mut();
    recorder.record_call();
    for _ in 0..attempts {
        recorder.record_attempt();
    }
    match latency {
        Some(latency) => {
            recorder.record_success();
            recorder.record_latency(latency);
        }
        None => recorder.record_failure(),
    }
}

#[test]
fn trait_object_handles_update_the_same_stats() {
    let stats = Rc::new(RefCell::new(SimulationStats::with_label("shared")));
    let client_side: Rc<RefCell<dyn StatsRecorder>> = stats.clone();
    let server_side: Rc<RefCell<dyn StatsRecorder>> = stats.clone();

    report_call(&client_side, 1, Some(Duration::from_millis(500)));
    report_call(&server_side, 4, None);
    report_call(&client_side, 2, Some(Duration::from_millis(1500)));

    let stats = stats.borrow();
    assert_eq!(stats.unique_calls(), 3);
    assert_eq!(stats.attempts(), 7);
    assert_eq!(stats.successes(), 2);
    assert_eq!(stats.failures(), 1);
    assert_eq!(stats.mean_latency(), Ok(Duration::from_secs(1)));

    let load = stats.load_percent().unwrap();
    assert!((load - 700.0 / 3.0).abs() < 1e-9);
}

#[test]
fn every_call_failing_after_three_retries_is_four_hundred_percent() {
    let stats = Rc::new(RefCell::new(SimulationStats::new()));
    let recorder: Rc<RefCell<dyn StatsRecorder>> = stats.clone();
    for _ in 0..50 {
        report_call(&recorder, 4, None);
    }

    let stats = stats.borrow();
    assert_eq!(stats.load_percent(), Ok(400.0));
    assert_eq!(stats.mean_latency(), Err(MetricsError::NoLatencySamples));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.failures, 50);
    assert_eq!(snapshot.latency_samples, 0);
}
