use serde::{Deserialize, Serialize};

/// One retained court-calendar case.
///
/// Never mutated after extraction; a later run producing the same identity is
/// a duplicate, not an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRecord {
    pub client_name: String,
    /// First whitespace-delimited token of the raw case-number field.
    pub case_number: String,
    pub court: String,
    #[serde(default)]
    pub appointment_date: Option<String>,
}

impl CaseRecord {
    /// Dedup identity: whitespace-stripped, uppercased (client, case) pair.
    pub fn identity(&self) -> (String, String) {
        (
            normalize_identity(&self.client_name),
            normalize_identity(&self.case_number),
        )
    }

    /// Folder name for this case under a client root.
    pub fn folder_name(&self) -> String {
        sanitize_component(&format!("{}; {}", self.client_name, self.case_number))
    }
}

/// Collapse a raw field into its dedup-normal form: all whitespace removed,
/// uppercased. "Jane Doe " and "JANE DOE" are the same identity.
pub fn normalize_identity(raw: &str) -> String {
    raw.split_whitespace().collect::<String>().to_uppercase()
}

/// Neutralize path separators so a record field can never escape its root
/// when used as a directory name.
pub fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            other => other,
        })
        .collect()
}

/// Partially-extracted calendar card. Every field is optional; the extractor
/// fills whatever the markup actually carried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseDraft {
    pub client_name: Option<String>,
    pub case_number: Option<String>,
    pub court: Option<String>,
    pub appointment_date: Option<String>,
}

impl CaseDraft {
    /// Promote to a full record. Requires both identity fields and the court;
    /// the appointment date stays optional.
    pub fn into_record(self) -> Option<CaseRecord> {
        Some(CaseRecord {
            client_name: self.client_name?,
            case_number: self.case_number?,
            court: self.court?,
            appointment_date: self.appointment_date,
        })
    }
}

/// One bond row from the contractor detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bond {
    pub company: String,
    pub number: String,
    pub amount: String,
}

/// One lawsuit row from the contractor detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lawsuit {
    pub case_number: String,
    pub county: String,
    pub parties: String,
    pub status: String,
}

/// Structured profile scraped from one contractor detail page.
///
/// Identity is positional within a single lookup session; there is no
/// cross-session dedup for these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractorRecord {
    pub registration_number: Option<String>,
    pub suspension_status: Option<String>,
    pub insurance_company: Option<String>,
    pub insurance_amount: Option<String>,
    #[serde(default)]
    pub bonds: Vec<Bond>,
    #[serde(default)]
    pub lawsuits: Vec<Lawsuit>,
}

impl ContractorRecord {
    /// True when no scalar field and no table row was recognized, which is
    /// what extraction of an unrelated page yields.
    pub fn is_empty(&self) -> bool {
        self.registration_number.is_none()
            && self.suspension_status.is_none()
            && self.insurance_company.is_none()
            && self.insurance_amount.is_none()
            && self.bonds.is_empty()
            && self.lawsuits.is_empty()
    }
}

/// What happened at one lookup source during a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// False when the human skipped this source at its checkpoint.
    pub visited: bool,
    pub records: usize,
    pub skipped_items: usize,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of one contractor lookup: the records aggregated across every
/// configured source, the total number of list entries that had to be
/// skipped, and a per-source report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractorLookup {
    pub ubi: String,
    pub records: Vec<ContractorRecord>,
    pub skipped: usize,
    #[serde(default)]
    pub sources: Vec<SourceReport>,
}

/// Aggregate counts reported to the caller at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Entries present in the source result set (after court filtering).
    pub found: usize,
    /// New ledger rows written this run.
    pub added: usize,
    /// Records whose identity was already in the ledger.
    pub duplicate: usize,
    /// Items skipped mid-crawl (timeout / stale reference).
    pub skipped: usize,
    /// Item-level extraction or persistence failures.
    pub failed: usize,
    #[serde(default)]
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "found={} added={} duplicate={} skipped={} failed={}",
            self.found, self.added, self.duplicate, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_case_and_whitespace() {
        assert_eq!(normalize_identity("Jane Doe "), "JANEDOE");
        assert_eq!(normalize_identity("JANE  DOE"), "JANEDOE");
        assert_eq!(normalize_identity("  jane\tdoe\n"), "JANEDOE");
    }

    #[test]
    fn test_folder_name_format() {
        let rec = CaseRecord {
            client_name: "Jane Doe".into(),
            case_number: "1A123456".into(),
            court: "SUNNYSIDE MUNICIPAL".into(),
            appointment_date: None,
        };
        assert_eq!(rec.folder_name(), "Jane Doe; 1A123456");
    }

    #[test]
    fn test_folder_name_neutralizes_separators() {
        let rec = CaseRecord {
            client_name: "Doe/Jane".into(),
            case_number: "1A..\\evil".into(),
            court: "X".into(),
            appointment_date: None,
        };
        assert!(!rec.folder_name().contains('/'));
        assert!(!rec.folder_name().contains('\\'));
    }

    #[test]
    fn test_contractor_record_emptiness() {
        assert!(ContractorRecord::default().is_empty());
        let populated = ContractorRecord {
            registration_number: Some("OMAKMS123AB".into()),
            ..Default::default()
        };
        assert!(!populated.is_empty());
    }

    #[test]
    fn test_draft_requires_identity_fields() {
        let draft = CaseDraft {
            client_name: Some("Jane Doe".into()),
            case_number: None,
            court: Some("SUNNYSIDE MUNICIPAL".into()),
            appointment_date: None,
        };
        assert!(draft.into_record().is_none());
    }
}
