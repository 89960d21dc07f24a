//! # Auth Module
//!
//! Maps tenant operator credentials to the tenant they act for. The tenant
//! id returned by `authenticate` is the key for all per-tenant storage.

mod crypto;
mod directory;
mod errors;

pub use crypto::{hash_password, verify_password, PasswordPolicy};
pub use directory::{Credential, TenantDirectory};
pub use errors::{AuthError, AuthResult};
