//! Tenant registry
//!
//! Each tenant owns an isolated Event Store, Model Store and feedback
//! counter. State is opened lazily on first use and cached behind `Arc`.
//! The registry map is only held while looking up or inserting an entry;
//! each tenant's stores sit behind their own mutex.

mod id;
mod lock;

pub use id::TenantId;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{LeadError, LeadResult};
use crate::model_store::{FileModelStore, InMemoryModelStore, ModelStore};
use crate::observability::Event;
use crate::storage::{EventStore, FileEventStore, InMemoryEventStore, StorageResult};

const TENANTS_DIR: &str = "tenants";

/// Everything one tenant owns
pub struct TenantState {
    id: TenantId,
    events: Mutex<Box<dyn EventStore>>,
    models: Mutex<Box<dyn ModelStore>>,
    feedback_counter: AtomicU64,
    lock_timeout: Duration,
}

impl TenantState {
    pub fn new(
        id: TenantId,
        events: Box<dyn EventStore>,
        models: Box<dyn ModelStore>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            id,
            events: Mutex::new(events),
            models: Mutex::new(models),
            feedback_counter: AtomicU64::new(0),
            lock_timeout,
        }
    }

    /// Fresh in-memory state
    pub fn in_memory(id: TenantId, max_versions: usize, lock_timeout: Duration) -> Self {
        let events = InMemoryEventStore::new(id.as_str());
        let models = InMemoryModelStore::new(id.as_str(), max_versions);
        Self::new(id, Box::new(events), Box::new(models), lock_timeout)
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Exclusive access to the Event Store, waiting at most the lock timeout
    pub fn events(&self) -> StorageResult<MutexGuard<'_, Box<dyn EventStore>>> {
        lock::acquire(&self.events, "event store", self.lock_timeout)
    }

    /// Exclusive access to the Model Store, waiting at most the lock timeout
    pub fn models(&self) -> StorageResult<MutexGuard<'_, Box<dyn ModelStore>>> {
        lock::acquire(&self.models, "model store", self.lock_timeout)
    }

    /// Counts one confirmation and returns the new count
    pub fn record_confirmation(&self) -> u64 {
        self.feedback_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Confirmations received since the last successful retrain
    pub fn pending_confirmations(&self) -> u64 {
        self.feedback_counter.load(Ordering::SeqCst)
    }

    /// Removes `seen` confirmations from the counter after a successful
    /// retrain. Confirmations counted after `seen` was read stay pending.
    pub fn acknowledge_confirmations(&self, seen: u64) {
        let _ = self
            .feedback_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(count.saturating_sub(seen))
            });
    }
}

/// Lazily opened, cached per-tenant state
pub struct TenantRegistry {
    data_dir: PathBuf,
    storage: StorageConfig,
    max_versions: usize,
    tenants: RwLock<HashMap<String, Arc<TenantState>>>,
}

impl TenantRegistry {
    pub fn new(data_dir: impl Into<PathBuf>, storage: StorageConfig, max_versions: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            storage,
            max_versions,
            tenants: RwLock::new(HashMap::new()),
        }
    }

    /// Directory holding a tenant's files
    pub fn tenant_dir(&self, id: &TenantId) -> PathBuf {
        self.data_dir.join(TENANTS_DIR).join(id.as_str())
    }

    /// Returns the tenant's state, opening or creating it as needed.
    pub fn get_or_create(&self, tenant_id: &str) -> LeadResult<Arc<TenantState>> {
        let id = TenantId::parse(tenant_id)?;
        if let Some(state) = self.cached(&id) {
            return Ok(state);
        }
        self.open(id)
    }

    /// Returns the tenant's state if the tenant has been seen before.
    ///
    /// For the file backend, a tenant directory left by an earlier process
    /// counts as seen.
    pub fn get(&self, tenant_id: &str) -> LeadResult<Arc<TenantState>> {
        let id = TenantId::parse(tenant_id)?;
        if let Some(state) = self.cached(&id) {
            return Ok(state);
        }
        let on_disk =
            self.storage.backend == StorageBackend::File && self.tenant_dir(&id).is_dir();
        if !on_disk {
            return Err(LeadError::TenantNotFound(id.into_string()));
        }
        self.open(id)
    }

    /// Identifiers of the tenants currently held in memory
    pub fn loaded_tenants(&self) -> Vec<String> {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = tenants.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn cached(&self, id: &TenantId) -> Option<Arc<TenantState>> {
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        tenants.get(id.as_str()).cloned()
    }

    /// Opens stores without holding the map lock, then inserts. If another
    /// caller won the race their state is kept and ours is dropped unused.
    fn open(&self, id: TenantId) -> LeadResult<Arc<TenantState>> {
        let lock_timeout = Duration::from_millis(self.storage.lock_timeout_ms);
        let state = match self.storage.backend {
            StorageBackend::Memory => TenantState::in_memory(id, self.max_versions, lock_timeout),
            StorageBackend::File => {
                let dir = self.tenant_dir(&id);
                let events = FileEventStore::open(&dir, id.as_str())?;
                let models = FileModelStore::open(&dir, id.as_str(), self.max_versions)?;
                TenantState::new(id, Box::new(events), Box::new(models), lock_timeout)
            }
        };

        let mut tenants = self.tenants.write().unwrap_or_else(|e| e.into_inner());
        let entry = tenants
            .entry(state.id().to_string())
            .or_insert_with(|| {
                info!(event = %Event::TenantOpened, tenant_id = %state.id());
                Arc::new(state)
            });
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Signals;
    use tempfile::TempDir;

    fn memory_registry() -> TenantRegistry {
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        TenantRegistry::new("unused", storage, 3)
    }

    #[test]
    fn test_get_or_create_caches_state() {
        let registry = memory_registry();
        let a = registry.get_or_create("acme").unwrap();
        let b = registry.get_or_create("acme").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.loaded_tenants(), vec!["acme".to_string()]);
    }

    #[test]
    fn test_get_unknown_tenant_is_not_found() {
        let registry = memory_registry();
        assert!(matches!(
            registry.get("nobody"),
            Err(LeadError::TenantNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_tenant_id_rejected() {
        let registry = memory_registry();
        assert!(matches!(
            registry.get_or_create("../etc"),
            Err(LeadError::Validation(_))
        ));
    }

    #[test]
    fn test_tenants_are_isolated() {
        let registry = memory_registry();
        let acme = registry.get_or_create("acme").unwrap();
        let globex = registry.get_or_create("globex").unwrap();

        acme.events()
            .unwrap()
            .append(Signals::new(5.0, 1, false).unwrap())
            .unwrap();

        assert_eq!(acme.events().unwrap().table().len(), 1);
        assert!(globex.events().unwrap().table().is_empty());
    }

    #[test]
    fn test_feedback_counter() {
        let registry = memory_registry();
        let acme = registry.get_or_create("acme").unwrap();
        assert_eq!(acme.record_confirmation(), 1);
        assert_eq!(acme.record_confirmation(), 2);
        acme.acknowledge_confirmations(2);
        assert_eq!(acme.pending_confirmations(), 0);
    }

    #[test]
    fn test_late_confirmation_stays_pending() {
        let registry = memory_registry();
        let acme = registry.get_or_create("acme").unwrap();
        acme.record_confirmation();
        let seen = acme.pending_confirmations();
        acme.record_confirmation();

        acme.acknowledge_confirmations(seen);
        assert_eq!(acme.pending_confirmations(), 1);
        acme.acknowledge_confirmations(5);
        assert_eq!(acme.pending_confirmations(), 0);
    }

    #[test]
    fn test_file_backend_reopens_existing_tenant() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::default();

        {
            let registry = TenantRegistry::new(temp.path(), storage.clone(), 3);
            let acme = registry.get_or_create("acme").unwrap();
            acme.events()
                .unwrap()
                .append(Signals::new(5.0, 1, false).unwrap())
                .unwrap();
        }

        let registry = TenantRegistry::new(temp.path(), storage, 3);
        let acme = registry.get("acme").unwrap();
        assert_eq!(acme.events().unwrap().table().len(), 1);
        assert!(registry.get("globex").is_err());
    }
}
