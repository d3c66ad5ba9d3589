//! Case-collection workflow: calendar page → checkpoint → filter-and-extract
//! over the rendered result set → folders + ledger.
//!
//! The calendar renders every assigned case on one page, so this workflow
//! does not drive the per-item detail crawl; it extracts the already-live
//! result set after the human clears the entry challenge.

use crate::artifacts::materialize_case_folders;
use crate::core::config::DocketConfig;
use crate::core::types::RunSummary;
use crate::crawl::snapshot::SnapshotDir;
use crate::crawl::wait_for_selector;
use crate::extract::case::{extract_case_cards, filter_retained, CALENDAR_CARD_SELECTOR};
use crate::ledger::{CaseLedger, LedgerOutcome};
use crate::session::{GateDecision, HumanGate, Session, SessionCoordinator, SessionError};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Open the calendar site, wait for the human, then collect the retained
/// court's cases into folders and the ledger. The summary reports every
/// skip and failure; the session is closed on every path.
pub async fn run_case_collection(
    coordinator: &SessionCoordinator,
    cfg: &DocketConfig,
    gate: &dyn HumanGate,
) -> Result<RunSummary> {
    let mut session = coordinator.open(&cfg.calendar_url).await?;
    let result = collect(&mut session, cfg, gate).await;
    if result.is_err() {
        session.mark_failed();
    }
    session.close().await;
    result
}

async fn collect(
    session: &mut Session,
    cfg: &DocketConfig,
    gate: &dyn HumanGate,
) -> Result<RunSummary> {
    let decision = session
        .await_checkpoint(
            gate,
            "Calendar page open. Solve any challenge, make sure your case list is showing.",
        )
        .await;
    if decision == GateDecision::Skip {
        info!("case collection skipped at checkpoint");
        return Ok(RunSummary {
            finished_at: Some(chrono::Utc::now()),
            ..Default::default()
        });
    }

    session.refresh().await?;
    session.mark_crawling();

    if !wait_for_selector(session.page(), CALENDAR_CARD_SELECTOR, cfg.detail_timeout).await {
        return Err(SessionError::Navigation(format!(
            "no calendar result cards appeared ({CALENDAR_CARD_SELECTOR})"
        ))
        .into());
    }

    let html = session
        .page()
        .content()
        .await
        .map_err(|e| SessionError::Navigation(format!("read calendar page: {e}")))?;

    if let Some(snaps) = cfg.debug_html_dir.as_ref().and_then(SnapshotDir::new) {
        snaps.save("calendar", &html);
    }

    let drafts = extract_case_cards(&html);
    info!("found {} cases (before filtering)", drafts.len());
    let records = filter_retained(drafts, &cfg.retained_court);
    info!(
        "{} cases retained for {}",
        records.len(),
        cfg.retained_court
    );

    materialize_case_folders(cfg, &records).context("materialize case folders")?;

    let mut ledger = CaseLedger::open(cfg.ledger_path())?;
    let mut summary = RunSummary {
        found: records.len(),
        ..Default::default()
    };
    for record in &records {
        match ledger.append_if_new(record) {
            Ok(LedgerOutcome::Added) => summary.added += 1,
            Ok(LedgerOutcome::Duplicate) => summary.duplicate += 1,
            Err(e) => {
                warn!(
                    "ledger append failed for ({}; {}): {}",
                    record.client_name, record.case_number, e
                );
                summary.failed += 1;
            }
        }
    }

    summary.finished_at = Some(chrono::Utc::now());
    info!("case collection done: {}", summary);
    Ok(summary)
}
