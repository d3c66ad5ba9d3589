pub mod artifacts;
pub mod browser;
pub mod core;
pub mod crawl;
pub mod extract;
pub mod ledger;
pub mod session;
pub mod workflows;

// --- Primary exports ---
pub use core::config::{load_config, DocketConfig, LookupSource};
pub use core::types;
pub use core::types::*;

pub use crawl::{CrawlError, CrawlOutcome, CrawlPlan, CrawlSurface, SkipReason};
pub use ledger::{CaseLedger, LedgerOutcome};
pub use session::checkpoint::{AutoGate, GateDecision, HumanGate, TerminalGate};
pub use session::{Session, SessionCoordinator, SessionError, SessionState};
pub use workflows::{run_case_collection, run_contractor_lookup};
