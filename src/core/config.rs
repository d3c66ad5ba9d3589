use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// DocketConfig: file-based config loader (docket-scout.json) with env-var
// fallback. Loaded once, resolved into a plain value object, and passed into
// the workflow orchestrators explicitly. No module-level mutable state.
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "DOCKET_SCOUT_CONFIG";
pub const ENV_BAR_NUMBER: &str = "DOCKET_SCOUT_BAR_NUMBER";
pub const ENV_CASE_ROOT: &str = "DOCKET_SCOUT_CASE_ROOT";
pub const ENV_SHARED_ROOT: &str = "DOCKET_SCOUT_SHARED_ROOT";
pub const ENV_DEBUG_HTML_DIR: &str = "DOCKET_SCOUT_DEBUG_HTML_DIR";

const DEFAULT_BAR_NUMBER: &str = "00000";
const DEFAULT_CALENDAR_URL: &str =
    "https://dw.courts.wa.gov/index.cfm?fa=home.atty&terms=accept&flashform=0";
const DEFAULT_RETAINED_COURT: &str = "SUNNYSIDE MUNICIPAL";

const DEFAULT_LNI_URL: &str = "https://secure.lni.wa.gov/verify/";
const DEFAULT_SOS_URL: &str = "https://ccfs.sos.wa.gov/#/BusinessSearch/UBI/{ubi}";
const DEFAULT_DOR_URL: &str = "https://secure.dor.wa.gov/gteunauth/_/#1";

/// Raw on-disk shape of `docket-scout.json`. All fields optional; absent
/// fields fall through to env vars and then built-in defaults.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct DocketConfigFile {
    /// Attorney bar number; keys the ledger file and the folder roots.
    pub bar_number: Option<String>,
    /// Primary root for per-client case folders and the ledger file.
    pub case_root: Option<String>,
    /// Mirrored shared root (office file share).
    pub shared_root: Option<String>,
    /// Only cases from this court are retained.
    pub retained_court: Option<String>,
    /// Court-calendar entry URL.
    pub calendar_url: Option<String>,
    /// Contractor-lookup sources, visited in order. Absent → the built-in
    /// LNI / SOS / DOR set.
    pub lookup_sources: Option<Vec<LookupSourceFile>>,
    /// Directory for raw-HTML diagnostic snapshots. Absent → snapshots off.
    pub debug_html_dir: Option<String>,
    /// Per-item detail-marker wait, in seconds.
    pub detail_timeout_secs: Option<u64>,
}

/// Raw on-disk shape of one contractor-lookup source.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct LookupSourceFile {
    pub name: String,
    /// Entry URL; a `{ubi}` placeholder is substituted per lookup.
    pub url: String,
    #[serde(default)]
    pub entry_selector: Option<String>,
    #[serde(default)]
    pub detail_marker: Option<String>,
    #[serde(default)]
    pub drive_search_form: bool,
}

/// One government site visited during a contractor lookup. Sources with an
/// `entry_selector`/`detail_marker` pair get the list→detail crawl; the rest
/// are capture-only (the human navigates to the business page at the
/// checkpoint, the current document is extracted as-is).
#[derive(Clone, Debug)]
pub struct LookupSource {
    pub name: String,
    pub url: String,
    pub entry_selector: Option<String>,
    pub detail_marker: Option<String>,
    pub drive_search_form: bool,
}

impl LookupSource {
    /// Entry URL for one UBI: `{ubi}` substituted where the site supports a
    /// deep link, the URL unchanged where it does not.
    pub fn url_for(&self, ubi: &str) -> String {
        self.url.replace("{ubi}", ubi)
    }
}

/// The built-in source set: LNI contractor verification (search form plus
/// result-list crawl), the Secretary of State corporate lookup (UBI deep
/// link), and the Department of Revenue business lookup (human-navigated).
pub fn default_lookup_sources() -> Vec<LookupSource> {
    vec![
        LookupSource {
            name: "lni".into(),
            url: DEFAULT_LNI_URL.into(),
            entry_selector: Some("div.resultItem".into()),
            detail_marker: Some("#layoutContainer".into()),
            drive_search_form: true,
        },
        LookupSource {
            name: "sos".into(),
            url: DEFAULT_SOS_URL.into(),
            entry_selector: None,
            detail_marker: None,
            drive_search_form: false,
        },
        LookupSource {
            name: "dor".into(),
            url: DEFAULT_DOR_URL.into(),
            entry_selector: None,
            detail_marker: None,
            drive_search_form: false,
        },
    ]
}

impl DocketConfigFile {
    fn resolve_bar_number(&self) -> String {
        if let Some(b) = &self.bar_number {
            if !b.trim().is_empty() {
                return b.trim().to_string();
            }
        }
        std::env::var(ENV_BAR_NUMBER)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BAR_NUMBER.to_string())
    }

    fn resolve_case_root(&self, bar: &str) -> PathBuf {
        if let Some(p) = &self.case_root {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        if let Ok(p) = std::env::var(ENV_CASE_ROOT) {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Desktop")
            .join(format!("{bar} Misdemeanor Clients"))
    }

    fn resolve_shared_root(&self, case_root: &std::path::Path) -> PathBuf {
        if let Some(p) = &self.shared_root {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        if let Ok(p) = std::env::var(ENV_SHARED_ROOT) {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        // No share configured; mirror next to the primary root.
        case_root.join("Shared")
    }

    fn resolve_debug_html_dir(&self) -> Option<PathBuf> {
        if let Some(p) = &self.debug_html_dir {
            if !p.trim().is_empty() {
                return Some(PathBuf::from(p));
            }
        }
        std::env::var(ENV_DEBUG_HTML_DIR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Resolve every field into a plain value object.
    pub fn resolve(&self) -> DocketConfig {
        let bar_number = self.resolve_bar_number();
        let case_root = self.resolve_case_root(&bar_number);
        let shared_root = self.resolve_shared_root(&case_root);
        DocketConfig {
            bar_number,
            case_root,
            shared_root,
            retained_court: self
                .retained_court
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RETAINED_COURT.to_string()),
            calendar_url: self
                .calendar_url
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CALENDAR_URL.to_string()),
            lookup_sources: match &self.lookup_sources {
                Some(sources) if !sources.is_empty() => sources
                    .iter()
                    .cloned()
                    .map(|s| LookupSource {
                        name: s.name,
                        url: s.url,
                        entry_selector: s.entry_selector,
                        detail_marker: s.detail_marker,
                        drive_search_form: s.drive_search_form,
                    })
                    .collect(),
                _ => default_lookup_sources(),
            },
            debug_html_dir: self.resolve_debug_html_dir(),
            detail_timeout: Duration::from_secs(self.detail_timeout_secs.unwrap_or(10)),
        }
    }
}

/// Fully-resolved configuration handed to the orchestrators.
#[derive(Clone, Debug)]
pub struct DocketConfig {
    pub bar_number: String,
    pub case_root: PathBuf,
    pub shared_root: PathBuf,
    pub retained_court: String,
    pub calendar_url: String,
    pub lookup_sources: Vec<LookupSource>,
    pub debug_html_dir: Option<PathBuf>,
    pub detail_timeout: Duration,
}

impl DocketConfig {
    /// Per-attorney directory that holds the case folders and the ledger.
    pub fn attorney_root(&self) -> PathBuf {
        self.case_root.join(&self.bar_number)
    }

    /// Mirrored per-attorney directory under the shared root.
    pub fn shared_attorney_root(&self) -> PathBuf {
        self.shared_root.join(format!("Clients {}", self.bar_number))
    }

    /// Ledger file path, a sibling of the case folders under the primary root.
    pub fn ledger_path(&self) -> PathBuf {
        self.attorney_root()
            .join(format!("{}_Cases.csv", self.bar_number))
    }
}

/// Load `docket-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `DOCKET_SCOUT_CONFIG` env var path
/// 2. explicit `--config` path handed in by the caller
/// 3. `./docket-scout.json` (process cwd)
/// 4. `docket-scout.json` next to the executable
///
/// Missing file → defaults (env-var fallbacks apply per field).
/// Parse error → log a warning, use defaults.
pub fn load_config(explicit: Option<&str>) -> DocketConfig {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        candidates.push(PathBuf::from(p));
    }
    if let Some(p) = explicit {
        candidates.push(PathBuf::from(p));
    }
    candidates.push(PathBuf::from("docket-scout.json"));
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("docket-scout.json"));
        }
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<DocketConfigFile>(&contents) {
                Ok(file) => {
                    tracing::info!("docket-scout.json loaded from {}", path.display());
                    return file.resolve();
                }
                Err(e) => {
                    tracing::warn!(
                        "docket-scout.json parse error at {}: {}, using defaults",
                        path.display(),
                        e
                    );
                    return DocketConfigFile::default().resolve();
                }
            },
            Err(_) => continue, // not found at this path, try next
        }
    }

    DocketConfigFile::default().resolve()
}
