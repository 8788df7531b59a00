//! Replacement Scan: swap every unprocessed poster placeholder for a video.
//!
//! The scan is idempotent. Placeholders are marked processed before the swap,
//! so a mutation notification caused by the swap itself finds nothing new,
//! and targets already under retry are skipped via the in-flight set.

mod blockers;
mod report;

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::dom::{
    is_processed, mark_processed, Document, MediaElement, MediaWidth, NodeId, SelectorList,
};
use crate::error::{DomError, ScanError, SelectorError};
use crate::resolver::{Resolution, UrlResolver};
use crate::retry::{RetryRegistry, RetryTimers};

pub use blockers::remove_blockers;
pub use report::{Replacement, ScanReport, SkipCounts, SkipReason};

/// Poster images that stand in for blocked videos.
pub const DEFAULT_PLACEHOLDER_SELECTORS: &[&str] = &[
    r#"img[src*="/data/attachments/posters/"]"#,
    r#"img[src*="/data/xfmg/poster/"]"#,
    ".fancybox-container .video-easter-egg-poster img",
];

/// Containers emphasized after a successful swap.
pub const DEFAULT_CONTAINER_SELECTORS: &[&str] =
    &["article", ".block", ".message", ".fancybox-slide"];

/// Class names of overlay elements removed on every pass.
pub const DEFAULT_BLOCKER_CLASSES: &[&str] =
    &["video-easter-egg-blocker", "video-easter-egg-overlay"];

static DEFAULT_SELECTORS: Lazy<ScanSelectors> = Lazy::new(|| {
    ScanSelectors::new(
        DEFAULT_PLACEHOLDER_SELECTORS,
        DEFAULT_CONTAINER_SELECTORS,
        DEFAULT_BLOCKER_CLASSES,
    )
    .expect("built-in selectors should parse")
});

/// Parsed selector sets used by the watcher and the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSelectors {
    pub placeholders: SelectorList,
    pub containers: SelectorList,
    pub blockers: SelectorList,
}

impl Default for ScanSelectors {
    fn default() -> Self {
        DEFAULT_SELECTORS.clone()
    }
}

impl ScanSelectors {
    pub fn new<P, C, B>(
        placeholders: &[P],
        containers: &[C],
        blocker_classes: &[B],
    ) -> Result<Self, SelectorError>
    where
        P: AsRef<str>,
        C: AsRef<str>,
        B: AsRef<str>,
    {
        Ok(Self {
            placeholders: SelectorList::parse_all(placeholders)?,
            containers: SelectorList::parse_all(containers)?,
            blockers: SelectorList::any_class(blocker_classes)?,
        })
    }
}

enum Item {
    Replaced(Replacement),
    Skipped(SkipReason),
    /// Same target already retrying elsewhere; try again when it finishes.
    Deferred(String),
}

/// One pass over the document.
pub struct ReplacementScan<'a> {
    resolver: &'a UrlResolver,
    selectors: &'a ScanSelectors,
}

impl<'a> ReplacementScan<'a> {
    pub fn new(resolver: &'a UrlResolver, selectors: &'a ScanSelectors) -> Self {
        Self {
            resolver,
            selectors,
        }
    }

    /// Process every placeholder currently in the document, in document order.
    /// Failures are isolated per placeholder and collected in the report.
    pub fn run<D, T>(&self, doc: &mut D, registry: &mut RetryRegistry, timers: &mut T) -> ScanReport
    where
        D: Document + ?Sized,
        T: RetryTimers + ?Sized,
    {
        let placeholders = doc.query_all(&self.selectors.placeholders);
        debug!("found {} poster image(s) to process", placeholders.len());
        let mut report = ScanReport {
            found: placeholders.len(),
            ..ScanReport::default()
        };
        for node in placeholders {
            match self.process(doc, registry, timers, node) {
                Ok(Item::Replaced(r)) => report.replaced.push(r),
                Ok(Item::Skipped(reason)) => report.skipped.record(reason),
                Ok(Item::Deferred(target)) => {
                    report.skipped.record(SkipReason::DuplicateInFlight);
                    report.deferred.push(target);
                }
                Err(e) => {
                    warn!("{e}");
                    report.errors.push(e.to_string());
                }
            }
        }
        report
    }

    fn process<D, T>(
        &self,
        doc: &mut D,
        registry: &mut RetryRegistry,
        timers: &mut T,
        node: NodeId,
    ) -> Result<Item, ScanError>
    where
        D: Document + ?Sized,
        T: RetryTimers + ?Sized,
    {
        if is_processed(doc, node) {
            debug!("{node} already replaced, skipping");
            return Ok(Item::Skipped(SkipReason::AlreadyProcessed));
        }
        let Some(source) = doc.attr(node, "src") else {
            return Ok(Item::Skipped(SkipReason::MissingSource));
        };
        let target = match self.resolver.resolve(&source) {
            Resolution::Resolved(t) => t,
            Resolution::Unresolved => {
                debug!("no matching pattern for {source}");
                return Ok(Item::Skipped(SkipReason::Unresolved));
            }
            Resolution::Excluded(t) => {
                debug!("skipping blocked thumbnail target {}", t.url);
                return Ok(Item::Skipped(SkipReason::Excluded));
            }
        };
        if registry.is_in_flight(&target.url) {
            debug!("already retrying {}, skipping", target.url);
            return Ok(Item::Deferred(target.url));
        }

        let failed = |e: DomError| ScanError {
            locator: source.clone(),
            source: e,
        };

        // Must precede the swap: the swap itself triggers another pass.
        mark_processed(doc, node).map_err(failed)?;

        let media = MediaElement {
            src: target.url.clone(),
            controls: true,
            width: doc
                .rendered_width(node)
                .map_or(MediaWidth::Fill, MediaWidth::Pixels),
        };
        let element = doc.create_media(&media).map_err(failed)?;
        registry.begin(element, &target.url, timers);

        if let Err(e) = doc.replace_with(node, element) {
            registry.abandon(element, timers);
            return Err(failed(e));
        }
        info!("replaced poster with video: {}", target.url);

        let emphasized = self.emphasize(doc, element);
        Ok(Item::Replaced(Replacement {
            placeholder: node,
            element,
            source,
            target,
            emphasized,
        }))
    }

    /// Bold the nearest enclosing container. Best effort.
    fn emphasize<D: Document + ?Sized>(&self, doc: &mut D, element: NodeId) -> bool {
        let Some(container) = doc.closest(element, &self.selectors.containers) else {
            debug!("no container to emphasize for {element}");
            return false;
        };
        match doc.set_style(container, "font-weight", "bold") {
            Ok(()) => true,
            Err(e) => {
                debug!("could not emphasize {container}: {e}");
                false
            }
        }
    }
}
