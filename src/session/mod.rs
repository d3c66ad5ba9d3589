//! Session coordinator: owns the browser driver lifecycle and the human
//! checkpoint protocol.
//!
//! One session = one visible browser process, one working page, one CDP
//! handler task. The crawl never begins before a checkpoint has been
//! observed; the browser is released on every exit path by running the
//! fallible workflow body first and closing unconditionally afterwards.

pub mod checkpoint;

use crate::browser::{build_visible_config, find_chrome_executable};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use rand::RngExt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub use checkpoint::{GateDecision, HumanGate};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no usable browser executable found (install Chrome/Chromium or set CHROME_EXECUTABLE)")]
    BrowserMissing,

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    Navigation(String),
}

/// Lifecycle: `Created → Opened → AwaitingHuman → Ready → Crawling → Closed`,
/// with `Failed → Closed` on error paths. Crawling is never entered without
/// passing through `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Opened,
    AwaitingHuman,
    Ready,
    Crawling,
    Failed,
    Closed,
}

fn log_state(state: SessionState) {
    info!("session_state={:?}", state);
}

/// Short randomized pause so automated actions land at a human-ish cadence.
pub async fn human_pause() {
    let ms = rand::rng().random_range(400..2600);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Resolves the browser executable once; hands out sessions.
pub struct SessionCoordinator {
    exe: String,
}

impl SessionCoordinator {
    /// Fails fast when no browser binary exists; this is the one error that
    /// aborts the process rather than the run.
    pub fn discover() -> Result<Self, SessionError> {
        let exe = find_chrome_executable().ok_or(SessionError::BrowserMissing)?;
        info!("using browser executable: {}", exe);
        Ok(Self { exe })
    }

    /// Launch a visible browser and navigate it to `entry_url`.
    pub async fn open(&self, entry_url: &str) -> Result<Session, SessionError> {
        let entry = url::Url::parse(entry_url)
            .map_err(|e| SessionError::Navigation(format!("invalid entry url {entry_url}: {e}")))?;
        log_state(SessionState::Created);

        let config = build_visible_config(&self.exe, 1280, 900)
            .map_err(|e| SessionError::LaunchFailed(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::LaunchFailed(format!("{} ({})", e, self.exe)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        human_pause().await;

        let page = browser
            .new_page(entry.as_str())
            .await
            .map_err(|e| SessionError::Navigation(format!("open {}: {}", entry, e)))?;

        log_state(SessionState::Opened);
        Ok(Session {
            browser,
            page,
            handler_task,
            state: SessionState::Opened,
        })
    }
}

/// A live browser session. Must be `close()`d exactly once on every exit
/// path; dropping without closing leaves a browser process behind.
pub struct Session {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    state: SessionState,
}

impl Session {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        log_state(state);
    }

    /// Suspend until the human releases the checkpoint latch. No timeout;
    /// the operator may take as long as the challenge needs.
    pub async fn await_checkpoint(&mut self, gate: &dyn HumanGate, prompt: &str) -> GateDecision {
        self.set_state(SessionState::AwaitingHuman);
        let decision = gate.wait(prompt).await;
        match decision {
            GateDecision::Proceed => self.set_state(SessionState::Ready),
            GateDecision::Skip => self.set_state(SessionState::Failed),
        }
        decision
    }

    /// Reload the current page so the DOM reflects any post-challenge state.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| SessionError::Navigation(format!("read current url: {}", e)))?
            .ok_or_else(|| SessionError::Navigation("page has no url".into()))?;
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| SessionError::Navigation(format!("refresh {}: {}", url, e)))?;
        Ok(())
    }

    pub fn mark_crawling(&mut self) {
        self.set_state(SessionState::Crawling);
    }

    pub fn mark_failed(&mut self) {
        self.set_state(SessionState::Failed);
    }

    /// Release the browser process. Close errors are logged, never surfaced;
    /// nothing the caller could do about them at this point.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close error (non-fatal): {}", e);
        }
        self.handler_task.abort();
        self.set_state(SessionState::Closed);
    }
}
