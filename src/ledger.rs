//! Append-only deduplicating case ledger.
//!
//! One CSV file per bar number. The file is never truncated or rewritten:
//! once the header row exists, this component only appends. The seen-set is
//! rebuilt from the file's own rows at the start of every run, which is what
//! makes repeated runs idempotent across process restarts. The `Date` and
//! `Case Count` columns are written empty; they belong to a human working
//! the file downstream.

use crate::core::types::{normalize_identity, CaseRecord};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const LEDGER_HEADER: [&str; 4] = ["Client Name", "Case Number", "Date", "Case Count"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Added,
    Duplicate,
}

/// Single-writer handle on the ledger file for the duration of a run.
pub struct CaseLedger {
    path: PathBuf,
    seen: HashSet<(String, String)>,
}

impl CaseLedger {
    /// Rebuild the seen-set from the existing file (skipping the header row).
    /// An absent file is an empty ledger; the header is written on first
    /// append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut seen = HashSet::new();

        if path.is_file() {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .from_path(&path)
                .with_context(|| format!("open ledger {}", path.display()))?;
            for row in reader.records() {
                let row = row.with_context(|| format!("parse ledger {}", path.display()))?;
                if row.len() >= 2 {
                    seen.insert((
                        normalize_identity(&row[0]),
                        normalize_identity(&row[1]),
                    ));
                }
            }
            info!(
                "ledger {}: {} known identities",
                path.display(),
                seen.len()
            );
        } else {
            info!("ledger {}: no existing file, starting fresh", path.display());
        }

        Ok(Self { path, seen })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn contains(&self, record: &CaseRecord) -> bool {
        self.seen.contains(&record.identity())
    }

    /// Append one row unless the record's identity is already known.
    /// Calling this with the same logical record any number of times, across
    /// any number of runs, persists exactly one row.
    pub fn append_if_new(&mut self, record: &CaseRecord) -> Result<LedgerOutcome> {
        let identity = record.identity();
        if self.seen.contains(&identity) {
            debug!(
                "ledger: duplicate, skipped ({}; {})",
                record.client_name, record.case_number
            );
            return Ok(LedgerOutcome::Duplicate);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create ledger dir {}", parent.display()))?;
        }

        let is_new_file = !self.path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("append to ledger {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new_file {
            writer.write_record(LEDGER_HEADER).context("write ledger header")?;
        }
        writer
            .write_record([
                record.client_name.trim(),
                record.case_number.trim(),
                "",
                "",
            ])
            .context("write ledger row")?;
        writer.flush().context("flush ledger")?;

        self.seen.insert(identity);
        info!(
            "ledger: added ({}; {})",
            record.client_name, record.case_number
        );
        Ok(LedgerOutcome::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(client: &str, case: &str) -> CaseRecord {
        CaseRecord {
            client_name: client.into(),
            case_number: case.into(),
            court: "SUNNYSIDE MUNICIPAL".into(),
            appointment_date: None,
        }
    }

    #[test]
    fn test_first_append_writes_header_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("123_Cases.csv");
        let mut ledger = CaseLedger::open(&path).unwrap();
        ledger.append_if_new(&record("DOE, JANE", "1A123456")).unwrap();
        ledger.append_if_new(&record("ROE, RICK", "2B654321")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Client Name,Case Number,Date,Case Count");
        assert_eq!(lines[1], "\"DOE, JANE\",1A123456,,");
    }

    #[test]
    fn test_duplicate_identity_skipped_within_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ledger = CaseLedger::open(tmp.path().join("l.csv")).unwrap();
        assert_eq!(
            ledger.append_if_new(&record("DOE, JANE", "1A123456")).unwrap(),
            LedgerOutcome::Added
        );
        // Case and whitespace differences are the same identity.
        assert_eq!(
            ledger.append_if_new(&record("doe,  jane ", "1a123456")).unwrap(),
            LedgerOutcome::Duplicate
        );
        assert_eq!(ledger.seen_count(), 1);
    }

    #[test]
    fn test_seen_set_rebuilt_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("l.csv");
        {
            let mut ledger = CaseLedger::open(&path).unwrap();
            ledger.append_if_new(&record("DOE, JANE", "1A123456")).unwrap();
        }
        // Fresh process: the file alone must carry the dedup state.
        let mut ledger = CaseLedger::open(&path).unwrap();
        assert_eq!(ledger.path(), path.as_path());
        assert_eq!(ledger.seen_count(), 1);
        assert!(ledger.contains(&record("doe, jane", "1a123456")));
        assert!(!ledger.contains(&record("ROE, RICK", "2B654321")));
        assert_eq!(
            ledger.append_if_new(&record("DOE, JANE", "1A123456")).unwrap(),
            LedgerOutcome::Duplicate
        );
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2); // header + one row
    }

    #[test]
    fn test_existing_rows_never_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("l.csv");
        {
            let mut ledger = CaseLedger::open(&path).unwrap();
            ledger.append_if_new(&record("DOE, JANE", "1A123456")).unwrap();
        }
        // A human filled the placeholder columns by hand.
        let annotated = std::fs::read_to_string(&path)
            .unwrap()
            .replace("1A123456,,", "1A123456,07/14/2026,3");
        std::fs::write(&path, &annotated).unwrap();

        let mut ledger = CaseLedger::open(&path).unwrap();
        ledger.append_if_new(&record("ROE, RICK", "2B654321")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        // Manual annotation survives; the new row was appended after it.
        assert!(contents.contains("07/14/2026,3"));
        assert!(contents.lines().last().unwrap().contains("2B654321"));
    }
}
