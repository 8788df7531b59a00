//! Live Retry Controllers keyed by element, plus the in-flight set.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::controller::RetryController;
use super::in_flight::InFlightTargets;
use super::policy::RetryPolicy;
use super::state::RetryPhase;
use super::RetryTimers;
use crate::dom::{Document, NodeId};

/// Reported load result for a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Final record of a finished retry sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryOutcome {
    #[serde(skip)]
    pub node: NodeId,
    pub target: String,
    pub phase: RetryPhase,
    pub attempts: u32,
}

/// Finished outcomes kept by [`RetryRegistry::new`].
pub const DEFAULT_HISTORY: usize = 1024;

/// Owns every live [`RetryController`] and the in-flight set they share.
///
/// One controller per element; registering a controller for an element that
/// already has one first tears the old one down, so an event is never handled
/// twice. Only the newest `history` finished outcomes are kept; callers that
/// need all of them drain with [`RetryRegistry::take_outcomes`].
#[derive(Debug)]
pub struct RetryRegistry {
    policy: RetryPolicy,
    in_flight: InFlightTargets,
    controllers: HashMap<NodeId, RetryController>,
    finished: VecDeque<RetryOutcome>,
    history: usize,
}

impl Default for RetryRegistry {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryRegistry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_history(policy, DEFAULT_HISTORY)
    }

    pub fn with_history(policy: RetryPolicy, history: usize) -> Self {
        Self {
            policy,
            in_flight: InFlightTargets::default(),
            controllers: HashMap::new(),
            finished: VecDeque::new(),
            history,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn in_flight(&self) -> &InFlightTargets {
        &self.in_flight
    }

    pub fn is_in_flight(&self, target: &str) -> bool {
        self.in_flight.contains(target)
    }

    /// Number of live controllers.
    pub fn active(&self) -> usize {
        self.controllers.len()
    }

    /// Current phase of the element's controller, live or finished.
    pub fn phase(&self, node: NodeId) -> Option<RetryPhase> {
        self.controllers
            .get(&node)
            .map(RetryController::phase)
            .or_else(|| self.outcome(node).map(|o| o.phase))
    }

    pub fn outcome(&self, node: NodeId) -> Option<&RetryOutcome> {
        self.finished.iter().rev().find(|o| o.node == node)
    }

    /// Retained outcomes, oldest first.
    pub fn outcomes(&self) -> impl Iterator<Item = &RetryOutcome> {
        self.finished.iter()
    }

    /// Hand over every retained outcome, leaving none behind.
    pub fn take_outcomes(&mut self) -> Vec<RetryOutcome> {
        self.finished.drain(..).collect()
    }

    /// Install a controller for a new element whose first load is running.
    pub fn begin<T: RetryTimers + ?Sized>(&mut self, node: NodeId, target: &str, timers: &mut T) {
        if let Some(mut previous) = self.controllers.remove(&node) {
            debug!("replacing existing controller on {node}");
            previous.abandon(&mut self.in_flight, timers);
        }
        self.finished.retain(|o| o.node != node);
        let controller = RetryController::begin(node, target, self.policy, &mut self.in_flight);
        self.controllers.insert(node, controller);
    }

    /// Route a load notification. Events for elements without a live
    /// controller are dropped.
    pub fn handle_load<D: Document + ?Sized, T: RetryTimers + ?Sized>(
        &mut self,
        node: NodeId,
        outcome: LoadOutcome,
        doc: &mut D,
        timers: &mut T,
    ) -> Option<RetryOutcome> {
        let Some(controller) = self.controllers.get_mut(&node) else {
            debug!("no controller for {node}, dropping {outcome:?}");
            return None;
        };
        let finished = match outcome {
            LoadOutcome::Loaded => controller.on_loaded(&mut self.in_flight, timers),
            LoadOutcome::Failed => controller.on_failed(doc, &mut self.in_flight, timers),
        };
        finished.and_then(|_| self.retire(node))
    }

    /// Route an elapsed retry timer.
    pub fn handle_retry_due<D: Document + ?Sized>(
        &mut self,
        node: NodeId,
        doc: &mut D,
    ) -> Option<RetryOutcome> {
        let controller = self.controllers.get_mut(&node)?;
        controller
            .on_retry_due(doc, &mut self.in_flight)
            .and_then(|_| self.retire(node))
    }

    /// Drop the element's controller without touching the document.
    pub fn abandon<T: RetryTimers + ?Sized>(
        &mut self,
        node: NodeId,
        timers: &mut T,
    ) -> Option<RetryOutcome> {
        let controller = self.controllers.get_mut(&node)?;
        controller
            .abandon(&mut self.in_flight, timers)
            .and_then(|_| self.retire(node))
    }

    /// Abandon every live controller, cancelling their pending timers.
    /// Returns how many were live.
    pub fn teardown<T: RetryTimers + ?Sized>(&mut self, timers: &mut T) -> usize {
        let nodes: Vec<NodeId> = self.controllers.keys().copied().collect();
        for node in &nodes {
            self.abandon(*node, timers);
        }
        self.in_flight.clear();
        nodes.len()
    }

    fn retire(&mut self, node: NodeId) -> Option<RetryOutcome> {
        let controller = self.controllers.remove(&node)?;
        let outcome = RetryOutcome {
            node,
            target: controller.target().to_string(),
            phase: controller.phase(),
            attempts: controller.attempts_started(),
        };
        self.finished.push_back(outcome.clone());
        while self.finished.len() > self.history {
            self.finished.pop_front();
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests;
