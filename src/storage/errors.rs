//! Storage error types shared by the event store and the model store
//!
//! Error codes:
//! - LEAD_STORAGE_WRITE_FAILED (ERROR severity)
//! - LEAD_STORAGE_READ_FAILED (ERROR severity)
//! - LEAD_STORAGE_LOCK_TIMEOUT (ERROR severity)
//! - LEAD_DATA_CORRUPTION (FATAL severity)
//!
//! FATAL means the tenant's on-disk state can no longer be trusted; every
//! other storage error only fails the request that hit it.

use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Event record or model artifact could not be written
    WriteFailed,
    /// Event log or artifact could not be read
    ReadFailed,
    /// A per-tenant lock stayed held past the configured timeout
    LockTimeout,
    /// Checksum, framing or artifact decoding failure
    DataCorruption,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::WriteFailed => "LEAD_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "LEAD_STORAGE_READ_FAILED",
            StorageErrorCode::LockTimeout => "LEAD_STORAGE_LOCK_TIMEOUT",
            StorageErrorCode::DataCorruption => "LEAD_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

/// Storage failure with a stable code and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::WriteFailed, message).with_source(source)
    }

    /// Write failure that did not come from the filesystem (e.g. encoding)
    pub fn write_failed_no_source(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::WriteFailed, message)
    }

    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StorageErrorCode::ReadFailed, message).with_source(source)
    }

    pub fn lock_timeout(resource: impl Into<String>, waited_ms: u64) -> Self {
        Self::new(
            StorageErrorCode::LockTimeout,
            format!("Timed out waiting for lock on {}", resource.into()),
        )
        .with_details(format!("waited_ms: {}", waited_ms))
    }

    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::DataCorruption, message)
    }

    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::data_corruption(reason).with_details(format!("byte_offset: {}", offset))
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)?;
        match &self.details {
            Some(details) => write!(f, " ({})", details),
            None => Ok(()),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::data_corruption("checksum mismatch").is_fatal());
        assert!(!StorageError::lock_timeout("tenant acme events", 2000).is_fatal());
        assert!(!StorageError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        )
        .is_fatal());
    }

    #[test]
    fn test_display_carries_code_and_offset() {
        let display = StorageError::corruption_at_offset(1024, "checksum mismatch").to_string();
        assert_eq!(
            display,
            "[FATAL] LEAD_DATA_CORRUPTION: checksum mismatch (byte_offset: 1024)"
        );
    }

    #[test]
    fn test_lock_timeout_details() {
        let err = StorageError::lock_timeout("tenant acme models", 150);
        assert_eq!(err.code(), StorageErrorCode::LockTimeout);
        assert_eq!(err.details(), Some("waited_ms: 150"));
        assert!(err.message().contains("tenant acme models"));
    }

    #[test]
    fn test_read_failure_keeps_io_source() {
        use std::error::Error;

        let err = StorageError::read_failed(
            "Failed to read events.log",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code().code(), "LEAD_STORAGE_READ_FAILED");
        assert!(err.source().is_some());
    }
}
