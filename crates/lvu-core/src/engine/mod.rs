//! Engine: owns the document, the retry registry and the event loop, and
//! dispatches host notifications one at a time.

mod event_loop;
mod watcher;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LvuConfig;
use crate::dom::{Document, NodeId};
use crate::resolver::UrlResolver;
use crate::retry::{
    LoadOutcome, RetryOutcome, RetryPhase, RetryPolicy, RetryRegistry, DEFAULT_HISTORY,
};
use crate::scan::{ScanReport, ScanSelectors};

pub use event_loop::{Event, EventLoop};
pub use watcher::{ChangeWatcher, WatchPass};

/// Everything the engine needs besides the document.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub resolver: UrlResolver,
    pub policy: RetryPolicy,
    pub selectors: ScanSelectors,
}

impl EngineSettings {
    /// Validate a loaded config and turn it into settings.
    pub fn from_config(cfg: &LvuConfig) -> Result<Self> {
        let media_host = cfg.validated_media_host()?;
        let selectors = match &cfg.selectors {
            Some(s) => ScanSelectors::new(&s.placeholders, &s.containers, &s.blockers)
                .context("invalid selector in config")?,
            None => ScanSelectors::default(),
        };
        Ok(Self {
            resolver: UrlResolver::new(&media_host),
            policy: cfg.retry_policy(),
            selectors,
        })
    }
}

/// Counters over the engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub events: usize,
    pub passes: usize,
    pub blockers_removed: usize,
    pub replaced: usize,
    pub item_errors: usize,
    pub succeeded: usize,
    pub exhausted: usize,
    pub abandoned: usize,
}

pub struct Engine<D: Document> {
    doc: D,
    settings: EngineSettings,
    registry: RetryRegistry,
    events: EventLoop,
    report: ScanReport,
    stats: SessionStats,
    /// Targets with a placeholder left unprocessed behind a live sequence.
    waiting: HashSet<String>,
    history: usize,
}

impl<D: Document> Engine<D> {
    pub fn new(doc: D, settings: EngineSettings) -> Self {
        Self::with_history(doc, settings, DEFAULT_HISTORY)
    }

    /// Keep at most `history` entries in each list of [`Engine::report`] and
    /// in the registry's finished outcomes.
    pub fn with_history(doc: D, settings: EngineSettings, history: usize) -> Self {
        let registry = RetryRegistry::with_history(settings.policy, history);
        Self {
            doc,
            settings,
            registry,
            events: EventLoop::new(),
            report: ScanReport::default(),
            stats: SessionStats::default(),
            waiting: HashSet::new(),
            history,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Direct access for host-side edits. Structural changes made here are
    /// picked up on the next [`Engine::run_until_idle`].
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &RetryRegistry {
        &self.registry
    }

    pub fn retry_phase(&self, node: NodeId) -> Option<RetryPhase> {
        self.registry.phase(node)
    }

    /// Scan reports of every pass so far, merged. Counts cover every pass;
    /// the lists hold the newest entries only.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Hand over the merged report and start a fresh one.
    pub fn take_report(&mut self) -> ScanReport {
        std::mem::take(&mut self.report)
    }

    /// Hand over the finished retry outcomes retained so far.
    pub fn take_outcomes(&mut self) -> Vec<RetryOutcome> {
        self.registry.take_outcomes()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.events.now()
    }

    pub fn notify_ready(&mut self) {
        self.events.push(Event::DocumentReady);
    }

    pub fn notify_mutations(&mut self, records: usize) {
        self.events.push_mutations(records);
    }

    pub fn notify_load(&mut self, node: NodeId, outcome: LoadOutcome) {
        self.events.push(Event::Load { node, outcome });
    }

    pub fn is_idle(&self) -> bool {
        !self.events.has_ready()
    }

    pub fn pending_timers(&self) -> usize {
        self.events.pending_timers()
    }

    /// Time until the earliest pending retry.
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.events
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.events.now()))
    }

    /// Handle ready events until the queue is empty. Returns how many were
    /// handled.
    pub fn run_until_idle(&mut self) -> usize {
        let changes = self.doc.take_changes();
        if changes > 0 {
            self.events.push_mutations(changes);
        }
        let mut handled = 0;
        while let Some(event) = self.events.pop() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Move the virtual clock forward, then run until idle.
    pub fn advance(&mut self, by: Duration) -> usize {
        let fired = self.events.advance(by);
        if fired > 0 {
            debug!("{fired} retry timer(s) due at {:?}", self.events.now());
        }
        self.run_until_idle()
    }

    /// Stop the engine: abandon live retries, cancel their timers and hand
    /// the document back.
    pub fn teardown(mut self) -> D {
        let live = self.registry.teardown(&mut self.events);
        let timers = self.events.clear_timers();
        self.waiting.clear();
        self.stats.abandoned += live;
        info!("engine torn down: {live} live retr(ies) abandoned, {timers} timer(s) cancelled");
        self.doc
    }

    fn dispatch(&mut self, event: Event) {
        self.stats.events += 1;
        match event {
            Event::DocumentReady => {
                debug!("document ready");
                self.watch_pass();
            }
            Event::Mutations { records } => {
                debug!("{records} mutation record(s)");
                self.watch_pass();
            }
            Event::Load { node, outcome } => {
                let finished =
                    self.registry
                        .handle_load(node, outcome, &mut self.doc, &mut self.events);
                self.record_finished(finished);
            }
            Event::RetryDue { node } => {
                let finished = self.registry.handle_retry_due(node, &mut self.doc);
                self.record_finished(finished);
            }
        }
        let changes = self.doc.take_changes();
        if changes > 0 {
            self.events.push_mutations(changes);
        }
    }

    fn watch_pass(&mut self) {
        let pass = ChangeWatcher::new(&self.settings).pass(
            &mut self.doc,
            &mut self.registry,
            &mut self.events,
        );
        self.stats.passes += 1;
        self.stats.blockers_removed += pass.blockers_removed;
        self.stats.replaced += pass.scan.replaced.len();
        self.stats.item_errors += pass.scan.errors.len();
        let mut scan = pass.scan;
        self.waiting.extend(scan.deferred.drain(..));
        self.report.merge(scan);
        self.report.keep_latest(self.history);
    }

    fn record_finished(&mut self, finished: Option<RetryOutcome>) {
        let Some(outcome) = finished else {
            return;
        };
        match outcome.phase {
            RetryPhase::Succeeded => self.stats.succeeded += 1,
            RetryPhase::Exhausted => self.stats.exhausted += 1,
            RetryPhase::Abandoned => self.stats.abandoned += 1,
            RetryPhase::Attempting(n) => {
                warn!("{} reported finished while attempting ({n})", outcome.target)
            }
        }
        if self.waiting.remove(&outcome.target) {
            debug!("{} is free again, rescanning for waiting posters", outcome.target);
            self.events.push_mutations(0);
        }
    }
}
