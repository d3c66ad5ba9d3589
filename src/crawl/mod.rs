//! List-index crawl with re-fetch.
//!
//! The detail view on these sites is reached by mutating the *same* page,
//! so an element handle is never trusted across a navigation boundary:
//! the entry set is re-queried fresh at the top of every iteration, and the
//! engine re-establishes the recorded list anchor after every detail visit
//! instead of relying on history-back. Individual item failures (detail
//! marker timeout, stale handle) are counted and skipped; only losing the
//! list anchor itself ends the crawl.

pub mod snapshot;

use crate::session::human_pause;
use async_trait::async_trait;
use chromiumoxide::Page;
use snapshot::SnapshotDir;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("result list never appeared (marker: {0})")]
    ListNotFound(String),

    #[error("cannot record list anchor: {0}")]
    AnchorUnavailable(String),

    #[error("cannot enumerate result entries: {0}")]
    Enumeration(String),
}

/// Why one list entry produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Detail marker did not appear within the bounded wait.
    DetailTimeout,
    /// The entry handle no longer corresponded to live content.
    StaleReference,
    /// Detail page appeared but its content could not be read.
    CaptureFailed,
}

#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub index: usize,
    pub reason: SkipReason,
}

/// Site-shape parameters for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    /// Selector matching each result entry on the list page.
    pub entry_selector: String,
    /// Selector whose appearance means the detail view has loaded.
    pub detail_marker: String,
    /// Selector whose appearance means the result list has loaded.
    pub list_marker: String,
    /// Bound on each detail-marker wait.
    pub detail_timeout: Duration,
}

/// Accumulated result of a crawl. `aborted` is set when the list anchor was
/// lost partway: the pages gathered so far are still valid, the remaining
/// indices were never attempted.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub pages: Vec<String>,
    pub skipped: Vec<SkippedItem>,
    pub aborted: bool,
}

impl CrawlOutcome {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// The page operations the crawl engine needs. The live implementation
/// drives a CDP page; anything else (a scripted page in tests) can stand in,
/// since the crawl logic only depends on these six observations.
#[async_trait]
pub trait CrawlSurface: Send + Sync {
    /// Current page URL, if the page has one.
    async fn anchor_url(&self) -> Option<String>;
    /// Number of entries currently matching `selector`. Always a fresh query.
    async fn entry_count(&self, selector: &str) -> Result<usize, String>;
    /// Re-query the entries and activate the one at `index` (scroll + click).
    async fn activate_entry(&self, selector: &str, index: usize) -> Result<(), String>;
    /// Whether `selector` currently matches anything.
    async fn is_present(&self, selector: &str) -> bool;
    /// Full HTML of the current document.
    async fn capture(&self) -> Result<String, String>;
    /// Navigate to `url`.
    async fn navigate(&self, url: &str) -> Result<(), String>;
}

/// Live CDP implementation of [`CrawlSurface`].
pub struct PageSurface<'a> {
    page: &'a Page,
}

impl<'a> PageSurface<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl CrawlSurface for PageSurface<'_> {
    async fn anchor_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn entry_count(&self, selector: &str) -> Result<usize, String> {
        self.page
            .find_elements(selector)
            .await
            .map(|entries| entries.len())
            .map_err(|e| e.to_string())
    }

    async fn activate_entry(&self, selector: &str, index: usize) -> Result<(), String> {
        // Never reuse handles from a previous query.
        let entries = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| e.to_string())?;
        let entry = entries
            .get(index)
            .ok_or_else(|| format!("entry {index} no longer present"))?;
        entry.scroll_into_view().await.map_err(|e| e.to_string())?;
        entry.click().await.map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn is_present(&self, selector: &str) -> bool {
        self.page.find_element(selector).await.is_ok()
    }

    async fn capture(&self) -> Result<String, String> {
        self.page.content().await.map_err(|e| e.to_string())
    }

    async fn navigate(&self, url: &str) -> Result<(), String> {
        self.page.goto(url).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Poll for `selector` every 250 ms until it exists or `timeout` elapses.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    wait_for(&PageSurface::new(page), selector, timeout).await
}

async fn wait_for<S: CrawlSurface + ?Sized>(
    surface: &S,
    selector: &str,
    timeout: Duration,
) -> bool {
    let start = Instant::now();
    loop {
        if surface.is_present(selector).await {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Enumerate the entries on the current list page and visit each one's
/// detail view, returning the captured detail HTML in list order.
///
/// The entry count observed at the start bounds the iteration but is not
/// assumed stable: a shrunken list stops the loop early with a partial
/// (non-fatal) result.
pub async fn crawl_list_details(
    page: &Page,
    plan: &CrawlPlan,
    snapshots: Option<&SnapshotDir>,
) -> Result<CrawlOutcome, CrawlError> {
    crawl_surface(&PageSurface::new(page), plan, snapshots).await
}

pub async fn crawl_surface<S: CrawlSurface + ?Sized>(
    surface: &S,
    plan: &CrawlPlan,
    snapshots: Option<&SnapshotDir>,
) -> Result<CrawlOutcome, CrawlError> {
    if !wait_for(surface, &plan.list_marker, plan.detail_timeout).await {
        return Err(CrawlError::ListNotFound(plan.list_marker.clone()));
    }

    let anchor = surface
        .anchor_url()
        .await
        .ok_or_else(|| CrawlError::AnchorUnavailable("page has no url".into()))?;

    // The list marker was just confirmed, so a failed enumeration here is a
    // session problem, not an empty result set.
    let total = surface
        .entry_count(&plan.entry_selector)
        .await
        .map_err(CrawlError::Enumeration)?;
    info!("crawl: {} entries at {}", total, anchor);

    let mut outcome = CrawlOutcome::default();

    for index in 0..total {
        human_pause().await;

        let live = match surface.entry_count(&plan.entry_selector).await {
            Ok(count) => count,
            Err(e) => {
                warn!("crawl: entry re-query failed at index {}: {}", index, e);
                outcome.aborted = true;
                break;
            }
        };
        if index >= live {
            info!(
                "crawl: list shrank to {} entries; stopping at index {}",
                live, index
            );
            break;
        }

        if let Err(e) = surface.activate_entry(&plan.entry_selector, index).await {
            warn!("crawl: stale entry at index {}: {}", index, e);
            outcome.skipped.push(SkippedItem {
                index,
                reason: SkipReason::StaleReference,
            });
            // DOM state is unknown after a half-activation; resynchronize.
            if !return_to_list(surface, &anchor, plan).await {
                outcome.aborted = true;
                break;
            }
            continue;
        }

        if wait_for(surface, &plan.detail_marker, plan.detail_timeout).await {
            match surface.capture().await {
                Ok(html) => {
                    if let Some(snaps) = snapshots {
                        snaps.save_indexed("detail", index + 1, &html);
                    }
                    outcome.pages.push(html);
                }
                Err(e) => {
                    warn!("crawl: content read failed at index {}: {}", index, e);
                    outcome.skipped.push(SkippedItem {
                        index,
                        reason: SkipReason::CaptureFailed,
                    });
                }
            }
        } else {
            warn!(
                "crawl: detail marker '{}' timed out at index {}",
                plan.detail_marker, index
            );
            outcome.skipped.push(SkippedItem {
                index,
                reason: SkipReason::DetailTimeout,
            });
        }

        // Unconditional re-synchronization before the next index.
        if !return_to_list(surface, &anchor, plan).await {
            warn!(
                "crawl: cannot recover list anchor after index {}; aborting remaining items",
                index
            );
            outcome.aborted = true;
            break;
        }
    }

    info!(
        "crawl: done, {} pages, {} skipped{}",
        outcome.pages.len(),
        outcome.skipped.len(),
        if outcome.aborted { " (aborted early)" } else { "" }
    );
    Ok(outcome)
}

/// Navigate back to the recorded list anchor and wait for the list marker.
async fn return_to_list<S: CrawlSurface + ?Sized>(
    surface: &S,
    anchor: &str,
    plan: &CrawlPlan,
) -> bool {
    if let Err(e) = surface.navigate(anchor).await {
        warn!("crawl: return to {} failed: {}", anchor, e);
        return false;
    }
    wait_for(surface, &plan.list_marker, plan.detail_timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const ENTRY: &str = "div.result-entry";
    const DETAIL: &str = "#detail-view";
    const LIST: &str = "div.result-list";

    #[derive(Clone, Copy, PartialEq)]
    enum View {
        List,
        Detail(usize),
        DetailPending(usize),
    }

    /// Scripted stand-in for a live page: a list of `entries`, of which the
    /// `stale` indices refuse activation and the `slow` indices navigate to a
    /// detail view whose marker never renders.
    struct ScriptedSurface {
        entries: usize,
        stale: Vec<usize>,
        slow: Vec<usize>,
        enumeration_fails: bool,
        view: Mutex<View>,
    }

    impl ScriptedSurface {
        fn with_entries(entries: usize) -> Self {
            Self {
                entries,
                stale: Vec::new(),
                slow: Vec::new(),
                enumeration_fails: false,
                view: Mutex::new(View::List),
            }
        }
    }

    #[async_trait]
    impl CrawlSurface for ScriptedSurface {
        async fn anchor_url(&self) -> Option<String> {
            Some("https://results.test/list".into())
        }

        async fn entry_count(&self, _selector: &str) -> Result<usize, String> {
            if self.enumeration_fails {
                return Err("node query failed".into());
            }
            Ok(self.entries)
        }

        async fn activate_entry(&self, _selector: &str, index: usize) -> Result<(), String> {
            if self.stale.contains(&index) {
                return Err("node detached".into());
            }
            *self.view.lock().unwrap() = if self.slow.contains(&index) {
                View::DetailPending(index)
            } else {
                View::Detail(index)
            };
            Ok(())
        }

        async fn is_present(&self, selector: &str) -> bool {
            match *self.view.lock().unwrap() {
                View::List => selector == LIST,
                View::Detail(_) => selector == DETAIL,
                View::DetailPending(_) => false,
            }
        }

        async fn capture(&self) -> Result<String, String> {
            match *self.view.lock().unwrap() {
                View::Detail(i) => Ok(format!("<html>entry {i}</html>")),
                _ => Err("not on a detail view".into()),
            }
        }

        async fn navigate(&self, _url: &str) -> Result<(), String> {
            *self.view.lock().unwrap() = View::List;
            Ok(())
        }
    }

    fn plan() -> CrawlPlan {
        CrawlPlan {
            entry_selector: ENTRY.into(),
            detail_marker: DETAIL.into(),
            list_marker: LIST.into(),
            detail_timeout: Duration::from_millis(600),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_skipped_and_later_entries_still_extracted() {
        let surface = ScriptedSurface {
            stale: vec![2],
            ..ScriptedSurface::with_entries(5)
        };
        let outcome = crawl_surface(&surface, &plan(), None).await.unwrap();
        assert_eq!(
            outcome.pages,
            vec![
                "<html>entry 0</html>",
                "<html>entry 1</html>",
                "<html>entry 3</html>",
                "<html>entry 4</html>",
            ]
        );
        assert_eq!(outcome.skipped_count(), 1);
        assert_eq!(outcome.skipped[0].index, 2);
        assert_eq!(outcome.skipped[0].reason, SkipReason::StaleReference);
        assert!(!outcome.aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_timeout_is_counted_not_fatal() {
        let surface = ScriptedSurface {
            slow: vec![1],
            ..ScriptedSurface::with_entries(3)
        };
        let outcome = crawl_surface(&surface, &plan(), None).await.unwrap();
        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.skipped[0].index, 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::DetailTimeout);
        assert!(!outcome.aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_enumeration_failure_is_an_error() {
        let surface = ScriptedSurface {
            enumeration_fails: true,
            ..ScriptedSurface::with_entries(4)
        };
        let result = crawl_surface(&surface, &plan(), None).await;
        assert!(matches!(result, Err(CrawlError::Enumeration(_))));
    }

    #[test]
    fn test_outcome_skip_accounting() {
        let mut outcome = CrawlOutcome::default();
        outcome.pages.push("<html></html>".into());
        outcome.skipped.push(SkippedItem {
            index: 2,
            reason: SkipReason::StaleReference,
        });
        assert_eq!(outcome.skipped_count(), 1);
        assert!(!outcome.aborted);
    }
}
