//! Overlay removal: stateless, no retries.

use tracing::{debug, info};

use crate::dom::{Document, SelectorList};

/// Remove every element matching `blockers`. Returns how many were removed.
pub fn remove_blockers<D: Document + ?Sized>(doc: &mut D, blockers: &SelectorList) -> usize {
    if blockers.is_empty() {
        return 0;
    }
    let found = doc.query_all(blockers);
    let mut removed = 0;
    for node in found {
        match doc.remove(node) {
            Ok(()) => removed += 1,
            Err(e) => debug!("blocker {node} already gone: {e}"),
        }
    }
    if removed > 0 {
        info!("removed {removed} blocker element(s)");
    }
    removed
}
