//! Write a seeded synthetic claims CSV.
//!
//! Usage: synth_claims [out.csv] [count] [seed]

use claimiq::data::write_claims_csv;
use claimiq::logging::{log, obj, v_str, Domain, Level};
use claimiq::state::Config;
use claimiq::synth::generate_claims;
use serde_json::json;
use std::path::PathBuf;

fn main() {
    let cfg = Config::from_env();
    let args: Vec<String> = std::env::args().collect();
    let out = PathBuf::from(args.get(1).cloned().unwrap_or(cfg.dataset_path));
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(cfg.synth_claims);
    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(cfg.synth_seed);

    let records = generate_claims(count, seed);
    if let Err(err) = write_claims_csv(&out, &records) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
    log(
        Level::Info,
        Domain::Data,
        "synthetic_written",
        obj(&[
            ("dataset", v_str(&out.display().to_string())),
            ("rows", json!(records.len())),
            ("seed", json!(seed)),
        ]),
    );
    println!("wrote {} claims to {}", records.len(), out.display());
}
