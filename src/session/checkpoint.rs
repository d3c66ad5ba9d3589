//! One-shot human checkpoint latch.
//!
//! Every checkpoint is a fresh latch: armed once, released at most once by a
//! human-facing "Continue" action, observed exactly once by the automation
//! task. Latches are never reused or reset mid-run. There is deliberately no
//! timeout on the wait; the human may take arbitrarily long.

use std::io::Write;
use tokio::sync::watch;
use tracing::{debug, info};

/// What the human decided at a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Challenge solved / page ready: resume the automation.
    Proceed,
    /// Skip this source entirely (no data from it this session).
    Skip,
}

/// Arm a fresh one-shot checkpoint latch.
pub fn arm() -> (CheckpointHandle, CheckpointWait) {
    let (tx, rx) = watch::channel(None::<GateDecision>);
    (CheckpointHandle { tx }, CheckpointWait { rx })
}

/// Releasing side of the latch, held by whatever surfaces the "Continue"
/// action to the human.
#[derive(Clone)]
pub struct CheckpointHandle {
    tx: watch::Sender<Option<GateDecision>>,
}

impl CheckpointHandle {
    /// Release the latch. A second release of an already-released latch is a
    /// logged no-op, never an error.
    pub fn release(&self, decision: GateDecision) {
        let mut released = false;
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(decision);
            released = true;
            true
        });
        if released {
            info!("checkpoint released: {:?}", decision);
        } else {
            debug!("checkpoint already released; ignoring repeat signal");
        }
    }
}

/// Waiting side of the latch, consumed by the session.
pub struct CheckpointWait {
    rx: watch::Receiver<Option<GateDecision>>,
}

impl CheckpointWait {
    /// Block until the latch is released. Unbounded by design.
    pub async fn wait(mut self) -> GateDecision {
        loop {
            if let Some(decision) = *self.rx.borrow() {
                return decision;
            }
            if self.rx.changed().await.is_err() {
                // Every handle dropped without a release; treat as a skip so
                // the run can finish with a reported gap instead of hanging.
                return GateDecision::Skip;
            }
        }
    }
}

/// Source of human checkpoint decisions. One implementation per front end;
/// each call arms a fresh latch.
#[async_trait::async_trait]
pub trait HumanGate: Send + Sync {
    async fn wait(&self, prompt: &str) -> GateDecision;
}

/// Terminal front end: prompts on stderr and reads one line from stdin.
/// ENTER (or anything else) proceeds; a lone `;` skips the source.
pub struct TerminalGate;

#[async_trait::async_trait]
impl HumanGate for TerminalGate {
    async fn wait(&self, prompt: &str) -> GateDecision {
        let (handle, wait) = arm();
        eprint!("{prompt} [ENTER to continue, ';' to skip] ");
        let _ = std::io::stderr().flush();
        tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            let decision = match std::io::stdin().read_line(&mut line) {
                Ok(_) if line.trim() == ";" => GateDecision::Skip,
                Ok(_) => GateDecision::Proceed,
                Err(_) => GateDecision::Skip,
            };
            handle.release(decision);
        });
        wait.wait().await
    }
}

/// Test/headless gate: releases immediately with a fixed decision, still
/// going through the latch so the set-once path is exercised.
pub struct AutoGate(pub GateDecision);

#[async_trait::async_trait]
impl HumanGate for AutoGate {
    async fn wait(&self, _prompt: &str) -> GateDecision {
        let (handle, wait) = arm();
        handle.release(self.0);
        wait.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_release_wakes_waiter() {
        let (handle, wait) = arm();
        let waiter = tokio::spawn(wait.wait());
        handle.release(GateDecision::Proceed);
        assert_eq!(waiter.await.unwrap(), GateDecision::Proceed);
    }

    #[tokio::test]
    async fn test_second_release_is_noop() {
        let (handle, wait) = arm();
        handle.release(GateDecision::Skip);
        // Repeat with a different decision must not overwrite the first.
        handle.release(GateDecision::Proceed);
        assert_eq!(wait.wait().await, GateDecision::Skip);
    }

    #[tokio::test]
    async fn test_dropped_handle_unblocks_as_skip() {
        let (handle, wait) = arm();
        drop(handle);
        assert_eq!(wait.wait().await, GateDecision::Skip);
    }

    #[tokio::test]
    async fn test_auto_gate_round_trip() {
        let gate = AutoGate(GateDecision::Proceed);
        assert_eq!(gate.wait("x").await, GateDecision::Proceed);
    }
}
