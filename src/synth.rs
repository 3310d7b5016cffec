//! Seeded synthetic claims for demos and tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::claims::{variance_pct, ClaimRecord, FactorWeights};

/// County and the state its venue sits in.
pub const VENUES: [(&str, &str); 12] = [
    ("Cook", "IL"),
    ("Mecklenburg", "NC"),
    ("Harris", "TX"),
    ("Maricopa", "AZ"),
    ("King", "WA"),
    ("Miami-Dade", "FL"),
    ("Dallas", "TX"),
    ("Orange", "CA"),
    ("Broward", "FL"),
    ("Riverside", "CA"),
    ("San Diego", "CA"),
    ("Bexar", "TX"),
];

pub const BODY_PARTS: [&str; 8] = ["Spine", "Neck", "Jaw", "Joint Left", "Right", "Leg", "Arm", "Head"];
pub const INJURIES: [&str; 7] = ["Whiplash", "Fracture", "JFLE", "SSUE", "Sprain", "Tear", "Contusion"];
pub const INJURY_GROUPS: [&str; 6] = [
    "Group_NB",
    "Group_JFL",
    "Group_SSU",
    "Group_LEG",
    "Group_HEAD",
    "Group_ARM",
];
pub const ADJUSTERS: [&str; 6] = [
    "Sarah Williams",
    "Mike Johnson",
    "Emily Chen",
    "David Martinez",
    "Lisa Anderson",
    "James Wilson",
];
pub const VENUE_RATINGS: [&str; 4] = ["moderate", "conservative", "liberal", "extreme"];

const CAUSATION_PROBABILITY: [f64; 4] = [0.3257, 0.2212, 0.4478, 0.0];
const CAUSATION_TX_DELAY: [f64; 2] = [0.1226, 0.0];
const CAUSATION_TX_GAPS: [f64; 2] = [0.1313, 0.0];
const CAUSATION_COMPLIANCE: [f64; 2] = [0.1474, 0.0864];
const SEVERITY_ALLOWED_TX_PERIOD: [f64; 6] = [1.4488, 0.0, 2.3490, 3.1606, 3.8533, 4.3507];
const SEVERITY_INITIAL_TX: [f64; 4] = [1.5445, 1.2406, 0.6738, 0.0];
const SEVERITY_INJECTIONS: [f64; 5] = [0.0, 1.9855, 3.0855, 3.4370, 5.1228];
const SEVERITY_OBJECTIVE_FINDINGS: [f64; 2] = [2.7611, 0.0];
const SEVERITY_PAIN_MGMT: [f64; 3] = [0.0, 0.6396, 1.1258];
const SEVERITY_TYPE_TX: [f64; 2] = [2.0592, 3.2501];
const SEVERITY_INJURY_SITE: [f64; 5] = [1.8450, 1.1767, 0.9862, 0.4866, 0.0];
const SEVERITY_CODE: [f64; 4] = [0.4864, 0.3803, 0.8746, 0.0];

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    // Tables are non-empty constants.
    *items.choose(rng).unwrap_or(&items[0])
}

fn claim_date(rng: &mut StdRng) -> String {
    let r: f64 = rng.gen();
    let year = if r < 0.3 {
        2023
    } else if r < 0.7 {
        2024
    } else {
        2025
    };
    // 2025 data runs through September.
    let last_month = if year == 2025 { 9 } else { 12 };
    let month = rng.gen_range(1..=last_month);
    let day = rng.gen_range(1..=28);
    format!("{}-{:02}-{:02}", year, month, day)
}

fn factors(rng: &mut StdRng) -> FactorWeights {
    FactorWeights {
        causation_probability: pick(rng, &CAUSATION_PROBABILITY),
        causation_tx_delay: pick(rng, &CAUSATION_TX_DELAY),
        causation_tx_gaps: pick(rng, &CAUSATION_TX_GAPS),
        causation_compliance: pick(rng, &CAUSATION_COMPLIANCE),
        severity_allowed_tx_period: pick(rng, &SEVERITY_ALLOWED_TX_PERIOD),
        severity_initial_tx: pick(rng, &SEVERITY_INITIAL_TX),
        severity_injections: pick(rng, &SEVERITY_INJECTIONS),
        severity_objective_findings: pick(rng, &SEVERITY_OBJECTIVE_FINDINGS),
        severity_pain_mgmt: pick(rng, &SEVERITY_PAIN_MGMT),
        severity_type_tx: pick(rng, &SEVERITY_TYPE_TX),
        severity_injury_site: pick(rng, &SEVERITY_INJURY_SITE),
        severity_code: pick(rng, &SEVERITY_CODE),
    }
}

/// `n` claims from a fixed seed. Same `(n, seed)`, same records.
pub fn generate_claims(n: usize, seed: u64) -> Vec<ClaimRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let claim_date = claim_date(&mut rng);
            let days_to_settlement = rng.gen_range(30..150);
            let severity = rng.gen_range(1..=15) as f64;
            let caution_score = rng.gen_range(0..=10) as f64;
            let venue_rating = pick(&mut rng, &VENUE_RATINGS).to_string();
            let impact_life = rng.gen_range(0..=4);
            let final_settlement = rng.gen_range(2_000..152_000) as f64;
            let predicted = final_settlement * rng.gen_range(0.7..1.3);
            let (county, state) = pick(&mut rng, &VENUES);

            ClaimRecord {
                claim_id: format!("CLM-{}", 1000 + i),
                claim_date,
                days_to_settlement,
                county: county.to_string(),
                state: state.to_string(),
                body_part: pick(&mut rng, &BODY_PARTS).to_string(),
                primary_injury: pick(&mut rng, &INJURIES).to_string(),
                injury_group: pick(&mut rng, &INJURY_GROUPS).to_string(),
                severity,
                caution_score,
                venue_rating,
                impact_life,
                final_settlement,
                predicted_pain_suffering: predicted,
                variance_pct: variance_pct(final_settlement, predicted),
                adjuster: pick(&mut rng, &ADJUSTERS).to_string(),
                factors: factors(&mut rng),
            }
        })
        .collect()
}
