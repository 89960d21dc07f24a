//! # Engine Errors
//!
//! Error kinds surfaced by scoring, confirmation and dashboard operations.
//!
//! "Insufficient data" is not an error kind: a trainer that cannot fit a
//! model returns `None`, it never raises.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for engine operations
pub type LeadResult<T> = Result<T, LeadError>;

/// Errors visible to callers of the lead engine
#[derive(Debug, Error)]
pub enum LeadError {
    /// Missing or malformed request field
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Lead id does not exist for the tenant
    #[error("Lead {lead_id} not found for tenant {tenant_id}")]
    LeadNotFound { tenant_id: String, lead_id: u64 },

    /// Tenant has never been seen
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// Event or model store I/O failure
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl LeadError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LeadError::Validation(message.into())
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            LeadError::Validation(_) => 400,
            LeadError::LeadNotFound { .. } => 404,
            LeadError::TenantNotFound(_) => 404,
            LeadError::Storage(_) => 500,
        }
    }

    /// Returns whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(LeadError::validation("time_on_site is required").status_code(), 400);
        assert_eq!(
            LeadError::LeadNotFound {
                tenant_id: "acme".to_string(),
                lead_id: 9
            }
            .status_code(),
            404
        );
        assert_eq!(LeadError::TenantNotFound("acme".to_string()).status_code(), 404);
        assert_eq!(
            LeadError::from(StorageError::data_corruption("bad record")).status_code(),
            500
        );
    }

    #[test]
    fn test_not_found_message_names_lead_and_tenant() {
        let err = LeadError::LeadNotFound {
            tenant_id: "acme".to_string(),
            lead_id: 42,
        };
        let message = err.to_string();
        assert!(message.contains("42"));
        assert!(message.contains("acme"));
        assert!(err.is_client_error());
    }
}
