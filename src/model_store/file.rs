//! File-backed model store
//!
//! Artifacts live at `<tenant_dir>/models/model-<version>.json` with the
//! version zero-padded so lexical and numeric order agree. Each artifact is
//! written to a temporary file, fsync'd and renamed into place, so a reader
//! never sees a half-written model.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::artifact::{ModelArtifact, ModelVersion, TrainedModel};
use super::versions::ModelVersions;
use super::ModelStore;
use crate::observability::Event;
use crate::storage::{StorageError, StorageResult};

const MODELS_DIR: &str = "models";
const FILE_PREFIX: &str = "model-";
const FILE_SUFFIX: &str = ".json";

pub struct FileModelStore {
    tenant_id: String,
    models_dir: PathBuf,
    max_versions: usize,
    versions: ModelVersions,
    current: Option<ModelArtifact>,
}

impl FileModelStore {
    /// Opens the tenant's model directory, creating it if missing.
    ///
    /// The current artifact is loaded eagerly; if it cannot be parsed the
    /// store opens with no current model.
    pub fn open(tenant_dir: &Path, tenant_id: &str, max_versions: usize) -> StorageResult<Self> {
        let models_dir = tenant_dir.join(MODELS_DIR);
        fs::create_dir_all(&models_dir).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to create model directory: {}", models_dir.display()),
                e,
            )
        })?;

        let versions = ModelVersions::from_existing(scan_versions(&models_dir)?);
        let current = versions
            .current()
            .and_then(|version| read_artifact(&models_dir, tenant_id, version));

        Ok(Self {
            tenant_id: tenant_id.to_string(),
            models_dir,
            max_versions,
            versions,
            current,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn write_artifact(&self, artifact: &ModelArtifact) -> StorageResult<()> {
        let final_path = artifact_path(&self.models_dir, artifact.version);
        let tmp_path = final_path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(artifact).map_err(|e| {
            StorageError::write_failed_no_source(format!("Failed to encode model artifact: {}", e))
        })?;

        let mut file = File::create(&tmp_path).map_err(|e| {
            StorageError::write_failed(format!("Failed to create {}", tmp_path.display()), e)
        })?;
        file.write_all(&bytes).map_err(|e| {
            StorageError::write_failed(format!("Failed to write {}", tmp_path.display()), e)
        })?;
        file.sync_all().map_err(|e| {
            StorageError::write_failed(format!("fsync failed on {}", tmp_path.display()), e)
        })?;

        fs::rename(&tmp_path, &final_path).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to publish model artifact {}", final_path.display()),
                e,
            )
        })
    }
}

impl ModelStore for FileModelStore {
    fn save(&mut self, model: TrainedModel) -> StorageResult<ModelArtifact> {
        let version = self.versions.next_version();
        let artifact = ModelArtifact::new(self.tenant_id.clone(), version, model);

        self.write_artifact(&artifact)?;
        self.versions.insert(version);
        self.current = Some(artifact.clone());

        for pruned in self.versions.prune(self.max_versions) {
            let path = artifact_path(&self.models_dir, pruned);
            if let Err(e) = fs::remove_file(&path) {
                // Left behind; re-pruned on a later save after reopen
                warn!(
                    event = %Event::ModelPruneFailed,
                    tenant_id = %self.tenant_id,
                    version = pruned.value(),
                    error = %e,
                    "failed to delete pruned model artifact"
                );
            }
        }

        Ok(artifact)
    }

    fn load_current(&self) -> Option<ModelArtifact> {
        self.current.clone()
    }

    fn versions(&self) -> Vec<ModelVersion> {
        self.versions.iter().collect()
    }
}

fn artifact_path(models_dir: &Path, version: ModelVersion) -> PathBuf {
    models_dir.join(format!("{}{:020}{}", FILE_PREFIX, version.value(), FILE_SUFFIX))
}

fn parse_version(file_name: &str) -> Option<ModelVersion> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse::<u64>()
        .ok()
        .map(ModelVersion)
}

fn scan_versions(models_dir: &Path) -> StorageResult<Vec<ModelVersion>> {
    let entries = fs::read_dir(models_dir).map_err(|e| {
        StorageError::read_failed(format!("Failed to list {}", models_dir.display()), e)
    })?;

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            StorageError::read_failed(format!("Failed to list {}", models_dir.display()), e)
        })?;
        if let Some(version) = entry.file_name().to_str().and_then(parse_version) {
            versions.push(version);
        }
    }
    Ok(versions)
}

fn read_artifact(models_dir: &Path, tenant_id: &str, version: ModelVersion) -> Option<ModelArtifact> {
    let path = artifact_path(models_dir, version);
    let parsed = fs::read(&path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice::<ModelArtifact>(&bytes).map_err(|e| e.to_string()));

    match parsed {
        Ok(artifact) if artifact.classifier.is_finite() => Some(artifact),
        Ok(_) => {
            warn!(
                event = %Event::ModelLoadFailed,
                tenant_id = %tenant_id,
                version = version.value(),
                "model artifact has non-finite parameters"
            );
            None
        }
        Err(error) => {
            warn!(
                event = %Event::ModelLoadFailed,
                tenant_id = %tenant_id,
                version = version.value(),
                error = %error,
                "model artifact unreadable, treating tenant as untrained"
            );
            None
        }
    }
}
