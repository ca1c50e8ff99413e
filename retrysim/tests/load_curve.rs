//! Failure-rate sweeps through the facade crate

use retrysim::prelude::*;

#[test]
fn fixed_policy_load_grows_with_failure_rate() {
    let base = ScenarioConfig::default().with_horizon(400.0);
    let rates = failure_rate_range(0.0, 1.0, 0.25);
    let curve = sweep_failure_rates(&base, &[RetryPolicyKind::Fixed], &rates).unwrap();

    let loads = curve.load_for(RetryPolicyKind::Fixed).unwrap();
    assert_eq!(loads.len(), rates.len());
    assert_eq!(loads[0], 100.0);
    assert_eq!(loads[4], 400.0);
    for pair in loads.windows(2) {
        assert!(pair[0] < pair[1], "load not increasing: {loads:?}");
    }
}

#[test]
fn curve_serializes_with_policy_names() {
    let base = ScenarioConfig::default().with_horizon(30.0);
    let curve = sweep_failure_rates(
        &base,
        &[RetryPolicyKind::CircuitBreaker, RetryPolicyKind::TokenBucketFixed],
        &[0.0, 1.0],
    )
    .unwrap();

    let json = serde_json::to_value(&curve).unwrap();
    assert_eq!(json["failure_rates"], serde_json::json!([0.0, 1.0]));
    assert_eq!(json["load_by_policy"]["circuit-breaker"][0], 100.0);
    assert_eq!(json["load_by_policy"]["circuit-breaker"][1], 100.0);
    assert!(json["load_by_policy"]["token-bucket-fixed"].is_array());
}

#[test]
fn scenario_report_round_trips_through_config_json() {
    let config: ScenarioConfig = serde_json::from_str(
        r#"{ "policy": "token-bucket", "horizon": 50.0, "server": { "failure_rate": 0.5 } }"#,
    )
    .unwrap();
    let report = run_scenario(&config).unwrap();

    assert_eq!(report.policy, RetryPolicyKind::TokenBucket);
    assert_eq!(report.failure_rate, 0.5);
    let load = report.load_percent().unwrap();
    assert!(load >= 100.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["policy"], "token-bucket");
    assert_eq!(json["stats"]["unique_calls"], report.stats.unique_calls);
}
