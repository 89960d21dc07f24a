//! CLI errors
//!
//! Each carries a stable `LEAD_CLI_*` code; main prints it and exits 1.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::LeadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    ConfigError,
    IoError,
    AlreadyInitialized,
    NotInitialized,
    BootFailed,
    /// An engine operation (import, train, stats) failed
    CommandFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "LEAD_CLI_CONFIG_ERROR",
            Self::IoError => "LEAD_CLI_IO_ERROR",
            Self::AlreadyInitialized => "LEAD_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "LEAD_CLI_NOT_INITIALIZED",
            Self::BootFailed => "LEAD_CLI_BOOT_FAILED",
            Self::CommandFailed => "LEAD_CLI_COMMAND_FAILED",
        }
    }
}

#[derive(Debug, Error)]
#[error("{}: {}", .code.code(), .message)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'leadscore init' first.",
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<LeadError> for CliError {
    fn from(e: LeadError) -> Self {
        Self::new(CliErrorCode::CommandFailed, e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::not_initialized();
        assert!(err.to_string().starts_with("LEAD_CLI_NOT_INITIALIZED: "));
    }

    #[test]
    fn test_lead_error_conversion() {
        let err = CliError::from(LeadError::TenantNotFound("acme".into()));
        assert_eq!(err.code(), &CliErrorCode::CommandFailed);
        assert!(err.message().contains("acme"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err = CliError::from(ConfigError::Invalid("eval_fraction".into()));
        assert_eq!(err.code_str(), "LEAD_CLI_CONFIG_ERROR");
    }
}
