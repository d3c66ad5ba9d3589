//! Workflow orchestrators.
//!
//! Each workflow composes the session coordinator, crawl engine, extractors,
//! and persistence for one use case and reports aggregate counts. Per-item
//! failures are logged and counted, never surfaced; only anchor-level
//! navigation failures (and a missing browser) fail a run.

pub mod cases;
pub mod contractor;

pub use cases::run_case_collection;
pub use contractor::run_contractor_lookup;
