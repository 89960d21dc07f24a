//! Ordered version set with retention pruning
//!
//! Shared by the file and in-memory model stores.

use std::collections::BTreeSet;

use super::artifact::ModelVersion;

/// Retained versions of one tenant's models, oldest first
#[derive(Debug, Clone, Default)]
pub struct ModelVersions {
    retained: BTreeSet<ModelVersion>,
    /// Highest version ever assigned, retained or not
    high_water: Option<ModelVersion>,
}

impl ModelVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from versions discovered in storage.
    pub fn from_existing(versions: impl IntoIterator<Item = ModelVersion>) -> Self {
        let retained: BTreeSet<ModelVersion> = versions.into_iter().collect();
        let high_water = retained.iter().next_back().copied();
        Self {
            retained,
            high_water,
        }
    }

    /// The version the next save will receive
    pub fn next_version(&self) -> ModelVersion {
        self.high_water.map_or(ModelVersion(1), |v| v.next())
    }

    /// Records a newly persisted version.
    pub fn insert(&mut self, version: ModelVersion) {
        self.retained.insert(version);
        if self.high_water.map_or(true, |hw| version > hw) {
            self.high_water = Some(version);
        }
    }

    /// The most recent retained version
    pub fn current(&self) -> Option<ModelVersion> {
        self.retained.iter().next_back().copied()
    }

    /// Drops the oldest versions beyond `cap` and returns them, oldest first.
    ///
    /// The current version is never returned, even with a cap of zero.
    pub fn prune(&mut self, cap: usize) -> Vec<ModelVersion> {
        let keep = cap.max(1);
        let excess = self.retained.len().saturating_sub(keep);
        let pruned: Vec<ModelVersion> = self.retained.iter().take(excess).copied().collect();
        for version in &pruned {
            self.retained.remove(version);
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ModelVersion> + '_ {
        self.retained.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(n: u64) -> ModelVersions {
        let mut v = ModelVersions::new();
        for _ in 0..n {
            let next = v.next_version();
            v.insert(next);
        }
        v
    }

    #[test]
    fn test_next_version_starts_at_one() {
        assert_eq!(ModelVersions::new().next_version(), ModelVersion(1));
        assert_eq!(versions(3).next_version(), ModelVersion(4));
    }

    #[test]
    fn test_prune_removes_oldest_first() {
        let mut v = versions(5);
        let pruned = v.prune(3);
        assert_eq!(pruned, vec![ModelVersion(1), ModelVersion(2)]);
        assert_eq!(v.len(), 3);
        assert_eq!(v.current(), Some(ModelVersion(5)));
    }

    #[test]
    fn test_prune_never_removes_current() {
        let mut v = versions(3);
        v.prune(0);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![ModelVersion(3)]);
    }

    #[test]
    fn test_versions_stay_monotonic_after_prune() {
        let mut v = versions(4);
        v.prune(1);
        assert_eq!(v.next_version(), ModelVersion(5));
    }

    #[test]
    fn test_from_existing_with_gaps() {
        let v = ModelVersions::from_existing([ModelVersion(7), ModelVersion(3)]);
        assert_eq!(v.current(), Some(ModelVersion(7)));
        assert_eq!(v.next_version(), ModelVersion(8));
    }
}
