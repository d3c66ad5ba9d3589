//! Per-case folder materialization.
//!
//! Two mirrored trees: the attorney's primary root (which also holds the
//! ledger) and the office share. Folder creation is idempotent; an existing
//! folder is a success, not an error, so repeated runs converge on the same
//! tree.

use crate::core::config::DocketConfig;
use crate::core::types::CaseRecord;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Create `path` and all missing parents; existing directories are a no-op.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("create directory {}", path.display()))?;
    debug!("ensured folder: {}", path.display());
    Ok(())
}

/// Materialize one `"{client}; {case}"` folder per record under both the
/// primary attorney root and the shared mirror. Both trees must complete
/// before the run is reported done; there is no ordering between them.
pub fn materialize_case_folders(cfg: &DocketConfig, records: &[CaseRecord]) -> Result<()> {
    let primary = cfg.attorney_root();
    let shared = cfg.shared_attorney_root();
    ensure_dir(&primary)?;
    ensure_dir(&shared)?;

    for record in records {
        let folder = record.folder_name();
        ensure_dir(&primary.join(&folder))?;
        ensure_dir(&shared.join(&folder))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DocketConfigFile;

    fn test_config(tmp: &Path) -> DocketConfig {
        DocketConfigFile {
            bar_number: Some("12345".into()),
            case_root: Some(tmp.join("primary").to_string_lossy().into_owned()),
            shared_root: Some(tmp.join("shared").to_string_lossy().into_owned()),
            ..Default::default()
        }
        .resolve()
    }

    fn record(client: &str, case: &str) -> CaseRecord {
        CaseRecord {
            client_name: client.into(),
            case_number: case.into(),
            court: "SUNNYSIDE MUNICIPAL".into(),
            appointment_date: None,
        }
    }

    #[test]
    fn test_folders_created_under_both_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let records = vec![record("DOE, JANE", "1A123456")];
        materialize_case_folders(&cfg, &records).unwrap();

        assert!(tmp
            .path()
            .join("primary/12345/DOE, JANE; 1A123456")
            .is_dir());
        assert!(tmp
            .path()
            .join("shared/Clients 12345/DOE, JANE; 1A123456")
            .is_dir());
    }

    #[test]
    fn test_materialization_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let records = vec![record("DOE, JANE", "1A123456")];
        materialize_case_folders(&cfg, &records).unwrap();
        materialize_case_folders(&cfg, &records).unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("primary/12345"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_separators_in_names_stay_inside_root() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let records = vec![record("DOE/JANE", "..\\1A1")];
        materialize_case_folders(&cfg, &records).unwrap();
        // Exactly one folder directly under the attorney root.
        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("primary/12345"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].contains('/'));
    }
}
