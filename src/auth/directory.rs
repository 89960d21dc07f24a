//! # Tenant Directory
//!
//! Operator credentials keyed by lowercase email. With a backing path the
//! whole directory is rewritten on every registration (temp file + rename).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use crate::tenant::TenantId;

/// One registered operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub tenant_id: String,
    /// Argon2id PHC string (never plaintext)
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct TenantDirectory {
    path: Option<PathBuf>,
    policy: PasswordPolicy,
    credentials: RwLock<HashMap<String, Credential>>,
}

impl TenantDirectory {
    pub fn in_memory(policy: PasswordPolicy) -> Self {
        Self {
            path: None,
            policy,
            credentials: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the directory at `path`, starting empty if the file is absent.
    pub fn open(path: impl Into<PathBuf>, policy: PasswordPolicy) -> AuthResult<Self> {
        let path = path.into();
        let credentials = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                AuthError::StorageError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let list: Vec<Credential> = serde_json::from_str(&content).map_err(|e| {
                AuthError::StorageError(format!("Invalid directory file {}: {}", path.display(), e))
            })?;
            list.into_iter()
                .map(|c| (c.email.to_lowercase(), c))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            policy,
            credentials: RwLock::new(credentials),
        })
    }

    /// Registers `email` as an operator of `tenant_id`
    pub fn register(&self, email: &str, password: &str, tenant_id: &str) -> AuthResult<Credential> {
        let email = normalize_email(email)?;
        let tenant_id = TenantId::parse(tenant_id)
            .map_err(|e| AuthError::InvalidTenant(e.to_string()))?
            .into_string();
        self.policy.validate(password)?;

        if self.contains(&email) {
            return Err(AuthError::EmailAlreadyExists);
        }

        // Hashed before the write lock; the email is re-checked under it.
        let credential = Credential {
            email: email.clone(),
            tenant_id,
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        let mut credentials = self.credentials.write().unwrap_or_else(|e| e.into_inner());
        if credentials.contains_key(&email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        credentials.insert(email.clone(), credential.clone());

        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &credentials) {
                credentials.remove(&email);
                return Err(e);
            }
        }
        Ok(credential)
    }

    /// Returns the tenant id for valid credentials
    pub fn authenticate(&self, email: &str, password: &str) -> AuthResult<String> {
        let email = email.trim().to_lowercase();
        let credential = {
            let credentials = self.credentials.read().unwrap_or_else(|e| e.into_inner());
            credentials
                .get(&email)
                .cloned()
                .ok_or(AuthError::InvalidCredentials)?
        };

        if verify_password(password, &credential.password_hash)? {
            Ok(credential.tenant_id)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn contains(&self, email: &str) -> bool {
        self.credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.credentials.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

fn persist(path: &Path, credentials: &HashMap<String, Credential>) -> AuthResult<()> {
    let storage_err = |what: &str, e: std::io::Error| {
        AuthError::StorageError(format!("{} {}: {}", what, path.display(), e))
    };

    let mut list: Vec<&Credential> = credentials.values().collect();
    list.sort_by(|a, b| a.email.cmp(&b.email));
    let bytes = serde_json::to_vec_pretty(&list)
        .map_err(|e| AuthError::StorageError(format!("Failed to encode directory: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_err("Failed to create parent of", e))?;
    }
    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).map_err(|e| storage_err("Failed to create", e))?;
    file.write_all(&bytes)
        .map_err(|e| storage_err("Failed to write", e))?;
    file.sync_all().map_err(|e| storage_err("fsync failed on", e))?;
    fs::rename(&tmp, path).map_err(|e| storage_err("Failed to replace", e))?;
    Ok(())
}
