//! In-memory model store

use std::collections::BTreeMap;

use super::artifact::{ModelArtifact, ModelVersion, TrainedModel};
use super::versions::ModelVersions;
use super::ModelStore;
use crate::storage::StorageResult;

#[derive(Debug)]
pub struct InMemoryModelStore {
    tenant_id: String,
    max_versions: usize,
    versions: ModelVersions,
    artifacts: BTreeMap<ModelVersion, ModelArtifact>,
}

impl InMemoryModelStore {
    pub fn new(tenant_id: impl Into<String>, max_versions: usize) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            max_versions,
            versions: ModelVersions::new(),
            artifacts: BTreeMap::new(),
        }
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(&mut self, model: TrainedModel) -> StorageResult<ModelArtifact> {
        let version = self.versions.next_version();
        let artifact = ModelArtifact::new(self.tenant_id.clone(), version, model);

        self.artifacts.insert(version, artifact.clone());
        self.versions.insert(version);
        for pruned in self.versions.prune(self.max_versions) {
            self.artifacts.remove(&pruned);
        }

        Ok(artifact)
    }

    fn load_current(&self) -> Option<ModelArtifact> {
        self.versions
            .current()
            .and_then(|version| self.artifacts.get(&version).cloned())
    }

    fn versions(&self) -> Vec<ModelVersion> {
        self.versions.iter().collect()
    }
}
