//! Per-pass results of a Replacement Scan.

use serde::Serialize;

use crate::dom::NodeId;
use crate::resolver::ResolvedTarget;

/// Why a placeholder was left alone. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyProcessed,
    /// No `src` attribute.
    MissingSource,
    /// The locator matches no known pattern.
    Unresolved,
    /// The target is a known-blocked thumbnail.
    Excluded,
    /// Another element is already retrying this target.
    DuplicateInFlight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub already_processed: usize,
    pub missing_source: usize,
    pub unresolved: usize,
    pub excluded: usize,
    pub duplicate_in_flight: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::AlreadyProcessed => &mut self.already_processed,
            SkipReason::MissingSource => &mut self.missing_source,
            SkipReason::Unresolved => &mut self.unresolved,
            SkipReason::Excluded => &mut self.excluded,
            SkipReason::DuplicateInFlight => &mut self.duplicate_in_flight,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.already_processed
            + self.missing_source
            + self.unresolved
            + self.excluded
            + self.duplicate_in_flight
    }
}

/// One placeholder swapped for a media element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    #[serde(skip)]
    pub placeholder: NodeId,
    #[serde(skip)]
    pub element: NodeId,
    pub source: String,
    pub target: ResolvedTarget,
    /// Whether an enclosing container was found and emphasized.
    pub emphasized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Placeholders matched by the selectors.
    pub found: usize,
    pub replaced: Vec<Replacement>,
    pub skipped: SkipCounts,
    /// Per-item failures; the scan continued past each of them.
    pub errors: Vec<String>,
    /// Targets whose placeholders were skipped as [`SkipReason::DuplicateInFlight`].
    #[serde(skip)]
    pub deferred: Vec<String>,
}

impl ScanReport {
    /// Fold another pass into this one.
    pub fn merge(&mut self, other: ScanReport) {
        self.found += other.found;
        self.replaced.extend(other.replaced);
        self.skipped.already_processed += other.skipped.already_processed;
        self.skipped.missing_source += other.skipped.missing_source;
        self.skipped.unresolved += other.skipped.unresolved;
        self.skipped.excluded += other.skipped.excluded;
        self.skipped.duplicate_in_flight += other.skipped.duplicate_in_flight;
        self.errors.extend(other.errors);
        self.deferred.extend(other.deferred);
    }

    /// Drop all but the newest `limit` entries of each list. Counts are kept.
    pub fn keep_latest(&mut self, limit: usize) {
        trim_front(&mut self.replaced, limit);
        trim_front(&mut self.errors, limit);
        trim_front(&mut self.deferred, limit);
    }
}

fn trim_front<T>(items: &mut Vec<T>, limit: usize) {
    if items.len() > limit {
        items.drain(..items.len() - limit);
    }
}
