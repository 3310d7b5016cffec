//! CSV boundary for claim datasets.
//!
//! Every value is normalized here so the rest of the crate can assume fully
//! typed records: a missing or malformed number becomes `0`, a missing
//! string becomes `""`, and a missing `variance_pct` is derived from the
//! settlement and prediction.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::claims::{variance_pct, ClaimRecord, FactorWeights, VARIANCE_REL_TOL};
use crate::logging::{log, log_dataset_loaded, obj, v_str, Domain, Level};

/// Required columns of the normalized schema, in export order.
pub const EXPECTED_COLUMNS: [&str; 16] = [
    "claim_id",
    "claim_date",
    "days_to_settlement",
    "county",
    "state",
    "body_part",
    "primary_injury",
    "injury_group",
    "severity",
    "caution_score",
    "venue_rating",
    "impact_life",
    "final_settlement",
    "predicted_pain_suffering",
    "variance_pct",
    "adjuster",
];

/// Optional factor weight columns.
pub const FACTOR_COLUMNS: [&str; 12] = [
    "causation_probability",
    "causation_tx_delay",
    "causation_tx_gaps",
    "causation_compliance",
    "severity_allowed_tx_period",
    "severity_initial_tx",
    "severity_injections",
    "severity_objective_findings",
    "severity_pain_mgmt",
    "severity_type_tx",
    "severity_injury_site",
    "severity_code",
];

/// Wide import headers accepted in place of their normalized column.
pub const COLUMN_ALIASES: [(&str, &str); 9] = [
    ("COUNTYNAME", "county"),
    ("VENUESTATE", "state"),
    ("VENUE_RATING", "venue_rating"),
    ("PRIMARY_INJURY", "primary_injury"),
    ("PRIMARY_BODYPART", "body_part"),
    ("INJURY_GROUP_CODE", "injury_group"),
    ("SEVERITY_SCORE", "severity"),
    ("SETTLEMENT_DAYS", "days_to_settlement"),
    ("IMPACT", "impact_life"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_rows: u64,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
    pub counties: usize,
    pub states: usize,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub expected: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub rows: u64,
    pub bad_rows: u64,
    pub defaulted_values: u64,
    pub derived_variance: u64,
    pub inconsistent_variance: u64,
    pub warnings: Vec<String>,
}

// ===== Column mapping =====

fn alias_target(name: &str) -> Option<&'static str> {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name.trim())
        .map(|(_, canonical)| *canonical)
}

fn canonical_column(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    alias_target(trimmed).or_else(|| {
        EXPECTED_COLUMNS
            .iter()
            .chain(FACTOR_COLUMNS.iter())
            .find(|c| c.eq_ignore_ascii_case(trimmed))
            .copied()
    })
}

/// Header position of each known column. A normalized name wins over its
/// alias when both are present.
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    index: HashMap<&'static str, usize>,
    width: usize,
}

impl ColumnMap {
    fn from_header(header: &[String], warnings: &mut Vec<String>) -> Self {
        let mut index = HashMap::new();
        for (pos, name) in header.iter().enumerate() {
            let Some(canonical) = canonical_column(name) else {
                continue;
            };
            if alias_target(name).is_some() {
                warnings.push(format!("legacy_column: {} -> {}", name.trim(), canonical));
                index.entry(canonical).or_insert(pos);
            } else {
                index.insert(canonical, pos);
            }
        }
        for col in EXPECTED_COLUMNS {
            if !index.contains_key(col) {
                warnings.push(format!("missing_column: {}", col));
            }
        }
        Self {
            index,
            width: header.len(),
        }
    }

    fn cell<'a>(&self, fields: &'a [String], column: &str) -> Option<&'a str> {
        self.index
            .get(column)
            .and_then(|&pos| fields.get(pos))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Per-row reader that counts every value it had to default.
struct RowReader<'a> {
    columns: &'a ColumnMap,
    fields: &'a [String],
    defaulted: u64,
}

impl<'a> RowReader<'a> {
    fn text(&mut self, column: &str) -> String {
        match self.columns.cell(self.fields, column) {
            Some(v) => v.to_string(),
            None => {
                self.defaulted += 1;
                String::new()
            }
        }
    }

    fn number<T: std::str::FromStr + Default>(&mut self, column: &str) -> T {
        match self.columns.cell(self.fields, column).map(str::parse::<T>) {
            Some(Ok(v)) => v,
            _ => {
                self.defaulted += 1;
                T::default()
            }
        }
    }

    /// Like `number`, but `NaN`, `inf` and overflowing literals count as
    /// malformed.
    fn real(&mut self, column: &str) -> f64 {
        match self
            .columns
            .cell(self.fields, column)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
        {
            Some(v) => v,
            None => {
                self.defaulted += 1;
                0.0
            }
        }
    }

    /// Factor columns are optional: absent means zero without counting.
    fn factor(&mut self, column: &str) -> f64 {
        if !self.columns.index.contains_key(column) {
            return 0.0;
        }
        self.real(column)
    }

    fn stored_variance(&self) -> Option<f64> {
        self.columns
            .cell(self.fields, "variance_pct")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// Splits one CSV line, honoring double quotes. `""` inside a quoted field
/// is a literal quote.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_row(columns: &ColumnMap, fields: &[String], report: &mut DataQualityReport) -> ClaimRecord {
    let mut row = RowReader {
        columns,
        fields,
        defaulted: 0,
    };
    let final_settlement = row.real("final_settlement");
    let predicted = row.real("predicted_pain_suffering");
    let stored = row.stored_variance();

    let record = ClaimRecord {
        claim_id: row.text("claim_id"),
        claim_date: row.text("claim_date"),
        days_to_settlement: row.number("days_to_settlement"),
        county: row.text("county"),
        state: row.text("state"),
        body_part: row.text("body_part"),
        primary_injury: row.text("primary_injury"),
        injury_group: row.text("injury_group"),
        severity: row.real("severity"),
        caution_score: row.real("caution_score"),
        venue_rating: row.text("venue_rating"),
        impact_life: row.number("impact_life"),
        final_settlement,
        predicted_pain_suffering: predicted,
        variance_pct: stored.unwrap_or_else(|| variance_pct(final_settlement, predicted)),
        adjuster: row.text("adjuster"),
        factors: FactorWeights {
            causation_probability: row.factor("causation_probability"),
            causation_tx_delay: row.factor("causation_tx_delay"),
            causation_tx_gaps: row.factor("causation_tx_gaps"),
            causation_compliance: row.factor("causation_compliance"),
            severity_allowed_tx_period: row.factor("severity_allowed_tx_period"),
            severity_initial_tx: row.factor("severity_initial_tx"),
            severity_injections: row.factor("severity_injections"),
            severity_objective_findings: row.factor("severity_objective_findings"),
            severity_pain_mgmt: row.factor("severity_pain_mgmt"),
            severity_type_tx: row.factor("severity_type_tx"),
            severity_injury_site: row.factor("severity_injury_site"),
            severity_code: row.factor("severity_code"),
        },
    };

    report.defaulted_values += row.defaulted;
    if stored.is_none() {
        report.derived_variance += 1;
    } else if !record.is_variance_consistent(VARIANCE_REL_TOL) {
        report.inconsistent_variance += 1;
    }
    record
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

// ===== Loading =====

/// Parses claims from any line source. The first non-comment line is the
/// header; rows whose field count differs from it are skipped as bad rows.
pub fn parse_claims<R: BufRead>(reader: R) -> Result<(Vec<ClaimRecord>, DataQualityReport)> {
    let mut report = DataQualityReport::default();
    let mut columns: Option<ColumnMap> = None;
    let mut records = Vec::new();

    for (lineno, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes.with_context(|| format!("read failed at line {}", lineno + 1))?;
        let line = String::from_utf8_lossy(&bytes);
        if std::str::from_utf8(&bytes).is_err() {
            report
                .warnings
                .push(format!("invalid_utf8: line {} decoded lossily", lineno + 1));
        }
        if is_skippable(&line) {
            continue;
        }
        let fields = split_csv_line(line.trim_end_matches('\r'));
        let Some(map) = columns.as_ref() else {
            columns = Some(ColumnMap::from_header(&fields, &mut report.warnings));
            continue;
        };
        if fields.len() != map.width {
            report.bad_rows += 1;
            report.warnings.push(format!(
                "bad_row: line {} has {} fields, header has {}",
                lineno + 1,
                fields.len(),
                map.width
            ));
            continue;
        }
        records.push(parse_row(map, &fields, &mut report));
    }

    if columns.is_none() {
        report.warnings.push("missing_header".to_string());
    }
    if report.inconsistent_variance > 0 {
        report.warnings.push(format!(
            "inconsistent_variance: {} rows differ from recomputed value",
            report.inconsistent_variance
        ));
    }
    report.rows = records.len() as u64;
    Ok((records, report))
}

pub fn load_claims(path: &Path) -> Result<(Vec<ClaimRecord>, DataQualityReport)> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let (records, report) = parse_claims(BufReader::new(file))?;
    let dataset = path.display().to_string();
    log_dataset_loaded(&dataset, report.rows, report.bad_rows, report.defaulted_values);
    for warning in &report.warnings {
        log(
            Level::Warn,
            Domain::Data,
            "data_warning",
            obj(&[("dataset", v_str(&dataset)), ("msg", v_str(warning))]),
        );
    }
    Ok((records, report))
}

// ===== Manifest & schema =====

pub fn analyze_claims_csv(path: &Path, now_ts: u64) -> Result<(DatasetManifest, DataQualityReport)> {
    let hash = file_sha256(path)?;
    let columns = read_header(path)?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let (records, report) = parse_claims(BufReader::new(file))?;

    let dates: BTreeSet<&str> = records
        .iter()
        .map(|c| c.claim_date.as_str())
        .filter(|d| !d.is_empty())
        .collect();
    let counties: BTreeSet<&str> = records.iter().map(|c| c.county.as_str()).collect();
    let states: BTreeSet<&str> = records.iter().map(|c| c.state.as_str()).collect();

    let manifest = DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count: report.rows,
        bad_rows: report.bad_rows,
        date_min: dates.first().map(|d| d.to_string()),
        date_max: dates.last().map(|d| d.to_string()),
        counties: counties.len(),
        states: states.len(),
        columns,
        warnings: report.warnings.clone(),
        generated_at_epoch: now_ts,
    };
    Ok((manifest, report))
}

pub fn validate_schema(path: &Path) -> Result<SchemaReport> {
    let header = read_header(path)?;
    let present: BTreeSet<&str> = header.iter().filter_map(|h| canonical_column(h)).collect();
    let expected: Vec<String> = EXPECTED_COLUMNS.iter().map(|s| s.to_string()).collect();
    let missing: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    let ok = missing.is_empty();
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: missing {:?}", missing)
    };
    Ok(SchemaReport {
        columns: header,
        expected,
        missing,
        ok,
        message,
    })
}

pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    for bytes in BufReader::new(file).split(b'\n') {
        let bytes = bytes?;
        let line = String::from_utf8_lossy(&bytes);
        if is_skippable(&line) {
            continue;
        }
        return Ok(split_csv_line(line.trim_end_matches('\r'))
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect());
    }
    Ok(Vec::new())
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("claims.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

// ===== Export =====

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Normalized schema, factor columns included.
pub fn to_csv_string(records: &[ClaimRecord]) -> String {
    let mut out = EXPECTED_COLUMNS
        .iter()
        .chain(FACTOR_COLUMNS.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for c in records {
        let f = &c.factors;
        let row = [
            quote(&c.claim_id),
            quote(&c.claim_date),
            c.days_to_settlement.to_string(),
            quote(&c.county),
            quote(&c.state),
            quote(&c.body_part),
            quote(&c.primary_injury),
            quote(&c.injury_group),
            c.severity.to_string(),
            c.caution_score.to_string(),
            quote(&c.venue_rating),
            c.impact_life.to_string(),
            c.final_settlement.to_string(),
            c.predicted_pain_suffering.to_string(),
            c.variance_pct.to_string(),
            quote(&c.adjuster),
            f.causation_probability.to_string(),
            f.causation_tx_delay.to_string(),
            f.causation_tx_gaps.to_string(),
            f.causation_compliance.to_string(),
            f.severity_allowed_tx_period.to_string(),
            f.severity_initial_tx.to_string(),
            f.severity_injections.to_string(),
            f.severity_objective_findings.to_string(),
            f.severity_pain_mgmt.to_string(),
            f.severity_type_tx.to_string(),
            f.severity_injury_site.to_string(),
            f.severity_code.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_claims_csv(path: &Path, records: &[ClaimRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, to_csv_string(records))
        .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header() -> String {
        EXPECTED_COLUMNS.join(",")
    }

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(split_csv_line("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(
            split_csv_line("1,\"Miami-Dade, FL\",x"),
            vec!["1", "Miami-Dade, FL", "x"]
        );
        assert_eq!(split_csv_line("\"say \"\"hi\"\"\""), vec!["say \"hi\""]);
    }

    #[test]
    fn test_parse_normalized_row() {
        let csv = format!(
            "{}\nCLM-1,2024-03-05,45,Cook,IL,Neck,Whiplash,Group_NB,7,4,liberal,2,12000,10000,20,Emily Chen\n",
            header()
        );
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        assert_eq!(records.len(), 1);
        let c = &records[0];
        assert_eq!(c.county, "Cook");
        assert_eq!(c.days_to_settlement, 45);
        assert_eq!(c.impact_life, 2);
        assert_eq!(c.variance_pct, 20.0);
        assert_eq!(report.defaulted_values, 0);
        assert_eq!(report.inconsistent_variance, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_values_default_and_variance_derives() {
        let csv = format!(
            "{}\nCLM-2,2024-03-05,abc,Cook,IL,,Sprain,Group_NB,,4,moderate,2,9000,10000,,Emily Chen\n",
            header()
        );
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        let c = &records[0];
        assert_eq!(c.days_to_settlement, 0);
        assert_eq!(c.body_part, "");
        assert_eq!(c.severity, 0.0);
        assert!((c.variance_pct + 10.0).abs() < 1e-9);
        assert_eq!(report.defaulted_values, 3);
        assert_eq!(report.derived_variance, 1);
    }

    #[test]
    fn test_bad_rows_are_counted_and_skipped() {
        let csv = format!("{}\nCLM-3,2024-01-01,45\n", header());
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.bad_rows, 1);
    }

    #[test]
    fn test_non_finite_numbers_default_to_zero() {
        use crate::filter::{apply_filters, FilterCriteria, FilterDimension};

        let csv = format!(
            "{}\nCLM-6,2024-03-05,45,Cook,IL,Neck,Whiplash,Group_NB,NaN,inf,liberal,2,inf,1e400,,Emily Chen\n",
            header()
        );
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        let c = &records[0];
        assert_eq!(c.severity, 0.0);
        assert_eq!(c.caution_score, 0.0);
        assert_eq!(c.final_settlement, 0.0);
        assert_eq!(c.predicted_pain_suffering, 0.0);
        assert!(c.variance_pct.is_finite());
        assert_eq!(report.defaulted_values, 4);

        let high = FilterCriteria::new().with(FilterDimension::Severity, "high");
        assert!(apply_filters(&records, &high).is_empty());
    }

    #[test]
    fn test_invalid_utf8_row_still_loads() {
        let mut csv = format!("{}\n", header()).into_bytes();
        csv.extend_from_slice(
            b"CLM-7,2024-03-05,45,C\xffok,IL,Neck,Whiplash,Group_NB,7,4,liberal,2,12000,10000,20,Emily Chen\n",
        );
        csv.extend_from_slice(
            b"CLM-8,2024-03-06,45,Cook,IL,Neck,Whiplash,Group_NB,7,4,liberal,2,12000,10000,20,Emily Chen\n",
        );
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].county, "C\u{FFFD}ok");
        assert_eq!(records[1].county, "Cook");
        assert_eq!(report.bad_rows, 0);
        assert!(report.warnings.iter().any(|w| w.starts_with("invalid_utf8: line 2")));
    }

    #[test]
    fn test_legacy_aliases_map_with_warning() {
        let csv = "claim_id,COUNTYNAME,VENUESTATE,SEVERITY_SCORE,final_settlement,predicted_pain_suffering\n\
                   CLM-4,Harris,TX,12,11000,10000\n";
        let (records, report) = parse_claims(Cursor::new(csv)).unwrap();
        assert_eq!(records[0].county, "Harris");
        assert_eq!(records[0].state, "TX");
        assert_eq!(records[0].severity, 12.0);
        assert!(report.warnings.iter().any(|w| w.starts_with("legacy_column: COUNTYNAME")));
        assert!(report.warnings.iter().any(|w| w == "missing_column: adjuster"));
    }

    #[test]
    fn test_export_reparses() {
        let csv = format!(
            "{}\nCLM-5,2024-06-01,30,\"Miami-Dade\",FL,\"Joint, Left\",Tear,Group_JFL,3,1,extreme,0,5000,4000,25,Lisa Anderson\n",
            header()
        );
        let (records, _) = parse_claims(Cursor::new(csv)).unwrap();
        let (again, report) = parse_claims(Cursor::new(to_csv_string(&records))).unwrap();
        assert_eq!(again, records);
        assert_eq!(report.defaulted_values, 0);
    }

    #[test]
    fn test_manifest_path() {
        let p = default_manifest_path(Path::new("data/claims.csv"));
        assert_eq!(p, PathBuf::from("data/claims.csv.manifest.json"));
    }
}
