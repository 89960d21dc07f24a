//! Credential directory errors

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown email and wrong password look the same to the caller
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    #[error("Password hashing failed")]
    HashingFailed,

    #[error("Directory storage failed: {0}")]
    StorageError(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidEmail | AuthError::WeakPassword(_) | AuthError::InvalidTenant(_) => {
                400
            }
            AuthError::InvalidCredentials => 401,
            AuthError::EmailAlreadyExists => 409,
            AuthError::HashingFailed | AuthError::StorageError(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::EmailAlreadyExists.status_code(), 409);
        assert_eq!(AuthError::InvalidTenant("..".into()).status_code(), 400);
        assert!(!AuthError::StorageError("disk".into()).is_client_error());
    }

    #[test]
    fn test_invalid_credentials_names_neither_field() {
        let message = AuthError::InvalidCredentials.to_string();
        assert!(!message.contains("password"));
        assert!(!message.contains("email"));
    }
}
