//! Change Watcher pass: blocker removal, then a replacement scan.

use tracing::debug;

use super::EngineSettings;
use crate::dom::Document;
use crate::retry::{RetryRegistry, RetryTimers};
use crate::scan::{remove_blockers, ReplacementScan, ScanReport};

/// Result of one watcher pass.
#[derive(Debug, Default)]
pub struct WatchPass {
    pub blockers_removed: usize,
    pub scan: ScanReport,
}

pub struct ChangeWatcher<'a> {
    settings: &'a EngineSettings,
}

impl<'a> ChangeWatcher<'a> {
    pub fn new(settings: &'a EngineSettings) -> Self {
        Self { settings }
    }

    pub fn pass<D, T>(&self, doc: &mut D, registry: &mut RetryRegistry, timers: &mut T) -> WatchPass
    where
        D: Document + ?Sized,
        T: RetryTimers + ?Sized,
    {
        let blockers_removed = remove_blockers(doc, &self.settings.selectors.blockers);
        let scan = ReplacementScan::new(&self.settings.resolver, &self.settings.selectors)
            .run(doc, registry, timers);
        debug!(
            "watcher pass: {} blocker(s) removed, {} found, {} replaced",
            blockers_removed,
            scan.found,
            scan.replaced.len()
        );
        WatchPass {
            blockers_removed,
            scan,
        }
    }
}
