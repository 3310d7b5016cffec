//! Print the dashboard for a claims dataset as JSON.
//!
//! Usage:
//!   claims_report [data.csv | --synthetic] [key=value ...] [--feature=GROUP] [--metric=settlement|variance|claims]
//!
//! Filters use the header keys (`county=Cook`, `severity=high`, `year=2024`, ...).

use anyhow::{anyhow, Result};
use claimiq::aggregate::venue::RegionalMetric;
use claimiq::data::load_claims;
use claimiq::logging::{log, log_report_built, obj, v_str, Domain, Level, ProfileScope};
use claimiq::state::{Config, Session};
use claimiq::synth::generate_claims;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct Args {
    source: Option<String>,
    synthetic: bool,
    filters: Vec<(String, String)>,
    feature: Option<String>,
    metric: Option<RegionalMetric>,
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    for arg in raw {
        if arg == "--synthetic" {
            args.synthetic = true;
        } else if let Some(v) = arg.strip_prefix("--feature=") {
            args.feature = Some(v.to_string()).filter(|v| !v.is_empty());
        } else if let Some(v) = arg.strip_prefix("--metric=") {
            args.metric = Some(v.parse()?);
        } else if arg.starts_with("--") {
            return Err(anyhow!("unknown flag: {}", arg));
        } else if let Some((k, v)) = arg.split_once('=') {
            args.filters.push((k.to_string(), v.to_string()));
        } else if args.source.is_none() {
            args.source = Some(arg);
        } else {
            return Err(anyhow!("unexpected argument: {}", arg));
        }
    }
    Ok(args)
}

fn run(args: Args, cfg: &Config) -> Result<String> {
    let records = if args.synthetic {
        generate_claims(cfg.synth_claims, cfg.synth_seed)
    } else {
        let path = PathBuf::from(args.source.clone().unwrap_or_else(|| cfg.dataset_path.clone()));
        let (records, report) = load_claims(&path)?;
        if records.is_empty() {
            return Err(anyhow!("no claims parsed from {}", path.display()));
        }
        if report.bad_rows > 0 {
            eprintln!("skipped {} bad rows", report.bad_rows);
        }
        records
    };

    let mut session = Session::new(records);
    for (key, value) in &args.filters {
        session.update_filter(key, value)?;
    }
    session.select_feature(args.feature.as_deref());
    if let Some(metric) = args.metric {
        session.set_regional_metric(metric);
    }

    let dashboard = {
        let _scope = ProfileScope::with_context(
            "dashboard_build",
            &[("source", v_str(if args.synthetic { "synthetic" } else { "csv" }))],
        );
        session.dashboard(cfg)
    };
    log_report_built(
        dashboard.total_claims,
        dashboard.alignment.counties.len(),
        session.selected_feature(),
    );
    Ok(dashboard.to_json())
}

fn main() {
    let cfg = Config::from_env();
    log(
        Level::Debug,
        Domain::System,
        "config",
        obj(&[("dataset", v_str(&cfg.dataset_path))]),
    );
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(2);
        }
    };
    match run(args, &cfg) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("report failed: {:#}", err);
            std::process::exit(1);
        }
    }
}
