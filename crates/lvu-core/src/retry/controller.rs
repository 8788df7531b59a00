//! Retry Controller: applies [`RetryState`] transitions to the document, the
//! in-flight set and the timer queue.

use tracing::{debug, info, warn};

use super::in_flight::InFlightTargets;
use super::policy::{FailureKind, RetryPolicy};
use super::state::{RetryPhase, RetryState, Transition};
use super::{RetryTimers, TimerId};
use crate::dom::{Document, NodeId};

#[derive(Debug)]
pub struct RetryController {
    node: NodeId,
    target: String,
    policy: RetryPolicy,
    state: RetryState,
    pending: Option<TimerId>,
}

impl RetryController {
    /// Start tracking a freshly created element whose first load is running.
    /// Registers `target` in the in-flight set.
    pub(super) fn begin(
        node: NodeId,
        target: &str,
        policy: RetryPolicy,
        in_flight: &mut InFlightTargets,
    ) -> Self {
        in_flight.insert(target);
        debug!(
            "loading {target} (attempt 1/{}) on {node}",
            policy.max_attempts()
        );
        Self {
            node,
            target: target.to_string(),
            policy,
            state: RetryState::new(),
            pending: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn phase(&self) -> RetryPhase {
        self.state.phase()
    }

    pub fn attempts_started(&self) -> u32 {
        self.state.attempts_started()
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Load succeeded. Returns the terminal phase if one was reached.
    pub fn on_loaded<T: RetryTimers + ?Sized>(
        &mut self,
        in_flight: &mut InFlightTargets,
        timers: &mut T,
    ) -> Option<RetryPhase> {
        let transition = self.state.on_loaded();
        if let Transition::Finished(phase) = transition {
            self.cancel_pending(timers);
            in_flight.remove(&self.target);
            info!(
                "video loaded: {} after {} attempt(s)",
                self.target,
                self.state.attempts_started()
            );
            return Some(phase);
        }
        None
    }

    /// Load failed. Schedules a retry, or gives up and removes the element.
    pub fn on_failed<D: Document + ?Sized, T: RetryTimers + ?Sized>(
        &mut self,
        doc: &mut D,
        in_flight: &mut InFlightTargets,
        timers: &mut T,
    ) -> Option<RetryPhase> {
        let attempt = self.state.attempts_started();
        match self.state.on_failed(&self.policy) {
            Transition::ScheduleRetry(delay) => {
                debug!(
                    kind = ?FailureKind::Transient,
                    "load failed (attempt {attempt}/{}), retrying in {}ms: {}",
                    self.policy.max_attempts(),
                    delay.as_millis(),
                    self.target
                );
                self.pending = Some(timers.schedule_retry(delay, self.node));
                None
            }
            Transition::Finished(phase) => {
                warn!(
                    kind = ?FailureKind::Terminal,
                    "all {attempt} attempt(s) failed, removing video: {}",
                    self.target
                );
                in_flight.remove(&self.target);
                if let Err(e) = doc.remove(self.node) {
                    warn!("could not remove {}: {e}", self.node);
                }
                Some(phase)
            }
            Transition::Ignored | Transition::Restart(_) => {
                debug!("ignoring failure event for {} in {:?}", self.node, self.phase());
                None
            }
        }
    }

    /// The retry delay elapsed: restart the load, or abandon if the element
    /// is gone.
    pub fn on_retry_due<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        in_flight: &mut InFlightTargets,
    ) -> Option<RetryPhase> {
        self.pending = None;
        match self.state.on_retry_due(doc.is_attached(self.node)) {
            Transition::Restart(retries) => {
                debug!(
                    "loading {} (attempt {}/{})",
                    self.target,
                    retries + 1,
                    self.policy.max_attempts()
                );
                if let Err(e) = doc.restart_load(self.node) {
                    warn!("could not restart load of {}: {e}", self.target);
                    self.state.abandon();
                    in_flight.remove(&self.target);
                    return Some(self.state.phase());
                }
                None
            }
            Transition::Finished(phase) => {
                info!("element left the document, dropping retry: {}", self.target);
                in_flight.remove(&self.target);
                Some(phase)
            }
            Transition::Ignored | Transition::ScheduleRetry(_) => None,
        }
    }

    /// Stop tracking without touching the document.
    pub fn abandon<T: RetryTimers + ?Sized>(
        &mut self,
        in_flight: &mut InFlightTargets,
        timers: &mut T,
    ) -> Option<RetryPhase> {
        self.cancel_pending(timers);
        match self.state.abandon() {
            Transition::Finished(phase) => {
                in_flight.remove(&self.target);
                Some(phase)
            }
            _ => None,
        }
    }

    fn cancel_pending<T: RetryTimers + ?Sized>(&mut self, timers: &mut T) {
        if let Some(id) = self.pending.take() {
            timers.cancel(id);
        }
    }
}
