//! Scripted media host for driving an engine without a network.
//!
//! Every replacement element fails a fixed number of load attempts and then
//! loads. Retry delays are slept in tokio time, so a paused test runtime
//! finishes instantly while still observing the delays.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::dom::{Document, Tree};
use crate::engine::{Engine, SessionStats};
use crate::retry::{LoadOutcome, RetryOutcome};

/// Failure counts per target locator.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoads {
    pub default_failures: u32,
    pub overrides: HashMap<String, u32>,
}

impl ScriptedLoads {
    pub fn new(default_failures: u32) -> Self {
        Self {
            default_failures,
            overrides: HashMap::new(),
        }
    }

    pub fn with_failures(mut self, target: impl Into<String>, failures: u32) -> Self {
        self.overrides.insert(target.into(), failures);
        self
    }

    pub fn failures_for(&self, target: &str) -> u32 {
        self.overrides
            .get(target)
            .copied()
            .unwrap_or(self.default_failures)
    }

    /// Outcome of the `attempt`-th load (1-based) of `target`.
    pub fn outcome(&self, target: &str, attempt: u32) -> LoadOutcome {
        if attempt <= self.failures_for(target) {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Loaded
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Virtual time spent waiting on retries.
    pub elapsed_ms: u64,
    /// Finished retry sequences, in element creation order.
    pub outcomes: Vec<RetryOutcome>,
    /// Controllers still live when the run stopped.
    pub still_running: usize,
    pub stats: SessionStats,
}

/// Feed scripted load outcomes to `engine` until no events or timers remain.
pub async fn run_scripted(engine: &mut Engine<Tree>, script: &ScriptedLoads) -> SimReport {
    let started = engine.now();
    let mut outcomes: Vec<RetryOutcome> = Vec::new();
    loop {
        engine.run_until_idle();
        outcomes.extend(engine.take_outcomes());
        let loads = engine.document_mut().take_started_loads();
        if !loads.is_empty() {
            for node in loads {
                let Some(target) = engine.document().attr(node, "src") else {
                    continue;
                };
                let attempt = engine.document().load_attempts(node);
                let outcome = script.outcome(&target, attempt);
                debug!("scripted load {attempt} of {target}: {outcome:?}");
                engine.notify_load(node, outcome);
                engine.run_until_idle();
                outcomes.extend(engine.take_outcomes());
            }
            continue;
        }
        let Some(wait) = engine.next_timer_in() else {
            break;
        };
        tokio::time::sleep(wait).await;
        engine.advance(wait);
    }

    outcomes.sort_by_key(|o| o.node);
    let elapsed: Duration = engine.now().saturating_sub(started);
    SimReport {
        elapsed_ms: elapsed.as_millis() as u64,
        outcomes,
        still_running: engine.registry().active(),
        stats: engine.stats().clone(),
    }
}
