//! Targets with a live retry sequence.

use std::collections::HashSet;

/// Set of target locators that currently have a Retry Controller.
///
/// Consulted by the scan before building a replacement and updated by the
/// controller when it starts and when it reaches a terminal state. Owned by
/// the [`RetryRegistry`](super::RetryRegistry); nothing global.
#[derive(Debug, Default)]
pub struct InFlightTargets {
    targets: HashSet<String>,
}

impl InFlightTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the target was already present.
    pub fn insert(&mut self, target: &str) -> bool {
        self.targets.insert(target.to_string())
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    pub fn remove(&mut self, target: &str) -> bool {
        self.targets.remove(target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_contains_remove() {
        let mut set = InFlightTargets::new();
        assert!(set.insert("https://cdn.example.com/a.mp4"));
        assert!(!set.insert("https://cdn.example.com/a.mp4"));
        assert!(set.contains("https://cdn.example.com/a.mp4"));
        assert_eq!(set.len(), 1);
        assert!(set.remove("https://cdn.example.com/a.mp4"));
        assert!(!set.remove("https://cdn.example.com/a.mp4"));
        assert!(set.is_empty());
    }
}
