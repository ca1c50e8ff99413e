//! Load on the server versus its failure rate, for every retry policy.
//!
//! ```bash
//! cargo run --example retry_load_sweep
//! cargo run --example retry_load_sweep -- 0.1 2000 --json
//! ```
//!
//! Optional arguments: failure-rate step (default 0.05), horizon in virtual
//! seconds (default 1000), and `--json` to print the curve as JSON.

use retrysim::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_simulation_logging_with_level("warn");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|arg| arg == "--json");
    let mut numbers = args.iter().filter(|arg| !arg.starts_with("--"));
    let step: f64 = numbers.next().map(|s| s.parse()).transpose()?.unwrap_or(0.05);
    let horizon: f64 = numbers.next().map(|s| s.parse()).transpose()?.unwrap_or(1_000.0);

    let base = ScenarioConfig::default().with_horizon(horizon);
    let rates = failure_rate_range(0.0, 1.0, step);
    let curve = sweep_failure_rates(&base, &RetryPolicyKind::ALL, &rates)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
        return Ok(());
    }

    println!(
        "Server load (% of unique calls) by failure rate, seed {}, horizon {horizon}s",
        base.simulation.seed
    );
    print!("{:>8}", "failure");
    for policy in curve.load_by_policy.keys() {
        print!("{:>20}", policy.as_str());
    }
    println!();

    for (i, rate) in curve.failure_rates.iter().enumerate() {
        print!("{rate:>8.2}");
        for loads in curve.load_by_policy.values() {
            print!("{:>20.1}", loads[i]);
        }
        println!();
    }

    Ok(())
}
