//! Model Store subsystem
//!
//! Per-tenant persisted classifier artifacts. Every save appends a new
//! version and then prunes the oldest versions beyond the retention cap.
//! The newest saved version is the tenant's current model.

mod artifact;
mod file;
mod memory;
mod versions;

pub use artifact::{
    predict_proba, EvaluationSet, ModelArtifact, ModelVersion, TrainedModel, TrainingMetrics,
};
pub use file::FileModelStore;
pub use memory::InMemoryModelStore;
pub use versions::ModelVersions;

use crate::storage::StorageResult;

/// Per-tenant versioned model storage
pub trait ModelStore: Send {
    /// Persists `model` as a new version, then prunes beyond the retention
    /// cap. The version just saved is never pruned.
    fn save(&mut self, model: TrainedModel) -> StorageResult<ModelArtifact>;

    /// The most recently saved model, or `None` if the tenant has never had
    /// a successful training run or the current artifact cannot be read.
    fn load_current(&self) -> Option<ModelArtifact>;

    /// Retained versions, oldest first
    fn versions(&self) -> Vec<ModelVersion>;
}
