//! Contractor-lookup workflow: one government site per source, each with its
//! own session and checkpoint, results aggregated across sources.
//!
//! The LNI verification source gets automated search-form entry plus the
//! multi-item list→detail crawl; the SOS and DOR sources are capture-only
//! (the human lands on the business page during the checkpoint, the current
//! document is extracted as-is). A failed or skipped source never prevents
//! the remaining sources from running; the records go back to the caller
//! (the intake-form filler lives downstream) and nothing is persisted here
//! except diagnostic snapshots.

use crate::core::config::{DocketConfig, LookupSource};
use crate::core::types::{ContractorLookup, ContractorRecord, SourceReport};
use crate::crawl::{crawl_list_details, snapshot::SnapshotDir, CrawlPlan};
use crate::extract::contractor::extract_contractor_detail;
use crate::session::{human_pause, GateDecision, HumanGate, Session, SessionCoordinator};
use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::{info, warn};

const SEARCH_TYPE_SELECT: &str = "#ctl00_cphMainContent_ddlSearchType";
const SEARCH_INPUT: &str = "#ctl00_cphMainContent_txtSearch";
const SEARCH_BUTTON: &str = "#ctl00_cphMainContent_btnSearch";

/// Visit every configured source for one UBI, wait for the human at each, and
/// return the aggregated records plus a per-source report.
pub async fn run_contractor_lookup(
    coordinator: &SessionCoordinator,
    cfg: &DocketConfig,
    ubi: &str,
    gate: &dyn HumanGate,
) -> Result<ContractorLookup> {
    let mut lookup = ContractorLookup {
        ubi: ubi.to_string(),
        ..Default::default()
    };

    for source in &cfg.lookup_sources {
        match visit_source(coordinator, cfg, source, ubi, gate).await {
            Ok(visit) => {
                lookup.skipped += visit.skipped_items;
                lookup.sources.push(SourceReport {
                    source: source.name.clone(),
                    visited: visit.visited,
                    records: visit.records.len(),
                    skipped_items: visit.skipped_items,
                    error: None,
                });
                lookup.records.extend(visit.records);
            }
            Err(e) => {
                // One broken source must not cost the others their turn.
                warn!("source {} failed for UBI {}: {:#}", source.name, ubi, e);
                lookup.sources.push(SourceReport {
                    source: source.name.clone(),
                    visited: true,
                    error: Some(format!("{e:#}")),
                    ..Default::default()
                });
            }
        }
    }

    info!(
        "contractor lookup {}: {} records across {} sources, {} skipped",
        ubi,
        lookup.records.len(),
        lookup.sources.len(),
        lookup.skipped
    );
    Ok(lookup)
}

struct SourceVisit {
    visited: bool,
    records: Vec<ContractorRecord>,
    skipped_items: usize,
}

async fn visit_source(
    coordinator: &SessionCoordinator,
    cfg: &DocketConfig,
    source: &LookupSource,
    ubi: &str,
    gate: &dyn HumanGate,
) -> Result<SourceVisit> {
    let mut session = coordinator.open(&source.url_for(ubi)).await?;
    let result = collect_from_source(&mut session, cfg, source, ubi, gate).await;
    if result.is_err() {
        session.mark_failed();
    }
    session.close().await;
    result
}

async fn collect_from_source(
    session: &mut Session,
    cfg: &DocketConfig,
    source: &LookupSource,
    ubi: &str,
    gate: &dyn HumanGate,
) -> Result<SourceVisit> {
    let decision = session
        .await_checkpoint(
            gate,
            &format!(
                "{} open for UBI {ubi}. Solve any challenge and navigate to the business if needed.",
                source.name
            ),
        )
        .await;
    if decision == GateDecision::Skip {
        info!("source {} skipped at checkpoint for UBI {}", source.name, ubi);
        return Ok(SourceVisit {
            visited: false,
            records: Vec::new(),
            skipped_items: 0,
        });
    }

    session.refresh().await?;

    let snapshots = cfg.debug_html_dir.as_ref().and_then(SnapshotDir::new);

    if source.drive_search_form {
        // Best-effort form automation. If the human already navigated to the
        // result list during the checkpoint, a failed form fill is harmless;
        // the crawl below starts from whatever list is on screen.
        if let Err(e) = submit_ubi_search(session.page(), ubi, snapshots.as_ref()).await {
            warn!(
                "UBI form automation failed on {} ({}); relying on manual navigation",
                source.name, e
            );
        }
    }

    session.mark_crawling();

    match (&source.entry_selector, &source.detail_marker) {
        (Some(entry_selector), Some(detail_marker)) => {
            let plan = CrawlPlan {
                entry_selector: entry_selector.clone(),
                detail_marker: detail_marker.clone(),
                list_marker: entry_selector.clone(),
                detail_timeout: cfg.detail_timeout,
            };
            let outcome = crawl_list_details(session.page(), &plan, snapshots.as_ref())
                .await
                .with_context(|| format!("result crawl on {}", source.name))?;
            if outcome.aborted {
                warn!(
                    "crawl on {} for {} ended early (list anchor lost)",
                    source.name, ubi
                );
            }
            let records = outcome
                .pages
                .iter()
                .map(|html| extract_contractor_detail(html))
                .collect::<Vec<_>>();
            Ok(SourceVisit {
                visited: true,
                skipped_items: outcome.skipped_count(),
                records,
            })
        }
        _ => {
            // Capture-only source: the checkpoint left the business page on
            // screen; extract whatever the current document carries.
            let html = session
                .page()
                .content()
                .await
                .map_err(|e| anyhow::anyhow!("read {} page: {}", source.name, e))?;
            if let Some(snaps) = snapshots.as_ref() {
                snaps.save(&source.name, &html);
            }
            let record = extract_contractor_detail(&html);
            let records = if record.is_empty() {
                info!("source {}: no recognizable fields on the page", source.name);
                Vec::new()
            } else {
                vec![record]
            };
            Ok(SourceVisit {
                visited: true,
                records,
                skipped_items: 0,
            })
        }
    }
}

/// Drive the UBI search form: pick "UBI Number" in the search-type dropdown,
/// type the number, click search. The dropdown is set through DOM events
/// because the site re-renders the form on the change postback.
async fn submit_ubi_search(
    page: &Page,
    ubi: &str,
    snapshots: Option<&SnapshotDir>,
) -> Result<()> {
    let select_js = format!(
        r#"(() => {{
            const sel = document.querySelector('{SEARCH_TYPE_SELECT}');
            if (!sel) return false;
            for (const opt of sel.options) {{
                if (opt.text.trim() === 'UBI Number') {{
                    sel.value = opt.value;
                    sel.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }}
            }}
            return false;
        }})()"#
    );
    let picked = page
        .evaluate(select_js)
        .await
        .context("search-type dropdown")?
        .into_value::<bool>()
        .unwrap_or(false);
    if !picked {
        anyhow::bail!("UBI Number option not found in search-type dropdown");
    }
    human_pause().await;

    let clear_js = format!(
        r#"(() => {{
            const input = document.querySelector('{SEARCH_INPUT}');
            if (input) input.value = '';
        }})()"#
    );
    page.evaluate(clear_js).await.context("clear search input")?;

    let input = page
        .find_element(SEARCH_INPUT)
        .await
        .context("search input")?;
    input.click().await.context("focus search input")?;
    input.type_str(ubi).await.context("type UBI")?;
    human_pause().await;

    if let Some(snaps) = snapshots {
        if let Ok(html) = page.content().await {
            snaps.save("after_enter_ubi", &html);
        }
    }

    page.find_element(SEARCH_BUTTON)
        .await
        .context("search button")?
        .click()
        .await
        .context("click search")?;
    Ok(())
}
