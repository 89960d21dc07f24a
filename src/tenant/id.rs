//! Tenant identifiers
//!
//! The tenant id is the trust boundary for all per-tenant storage: it is
//! validated before any path is built from it.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{LeadError, LeadResult};

const TENANT_ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$";

fn tenant_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TENANT_ID_PATTERN).expect("tenant id pattern is valid"))
}

/// A validated tenant identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> LeadResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LeadError::validation("tenant_id is required"));
        }
        if !tenant_id_regex().is_match(trimmed) || trimmed.contains("..") {
            return Err(LeadError::validation(format!(
                "tenant_id '{}' must be 1-64 characters of letters, digits, '_', '-' or '.'",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_ids() {
        for id in ["acme", "Acme-01", "tenant_2", "a.b", "7"] {
            assert_eq!(TenantId::parse(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(TenantId::parse("  acme ").unwrap().as_str(), "acme");
    }

    #[test]
    fn test_rejects_path_like_ids() {
        for id in ["", "  ", "../acme", "a/b", "a..b", ".hidden", "-x", "a b"] {
            assert!(TenantId::parse(id).is_err(), "accepted {:?}", id);
        }
    }

    #[test]
    fn test_rejects_overlong_ids() {
        let id = "a".repeat(65);
        assert!(TenantId::parse(&id).is_err());
        assert!(TenantId::parse(&"a".repeat(64)).is_ok());
    }
}
