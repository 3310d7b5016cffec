use claimiq::data::{analyze_claims_csv, default_manifest_path, validate_schema, EXPECTED_COLUMNS};
use claimiq::logging::{log, obj, v_str, Domain, Level};
use claimiq::state::Config;
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| Config::from_env().dataset_path);
    let path = PathBuf::from(path);

    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let schema = match validate_schema(&path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("schema check failed: {:#}", err);
            std::process::exit(1);
        }
    };

    if !schema.ok {
        eprintln!("schema mismatch: {}", schema.message);
        eprintln!("expected columns: {:?}", EXPECTED_COLUMNS);
        std::process::exit(2);
    }

    let (manifest, report) = match analyze_claims_csv(&path, now_ts) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("analysis failed: {:#}", err);
            std::process::exit(3);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = json!({
        "manifest": manifest,
        "report": report
    });
    let body = serde_json::to_string_pretty(&payload).unwrap_or_default();
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    log(
        Level::Info,
        Domain::Data,
        "manifest_written",
        obj(&[
            ("dataset", v_str(&manifest.path)),
            ("hash", v_str(&manifest.hash_sha256)),
            ("out", v_str(&out_path.display().to_string())),
        ]),
    );
    println!("wrote manifest {}", out_path.display());
}
