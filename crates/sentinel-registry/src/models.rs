//! # Core Data Models for the Persistence Port
//!
//! This module defines the primitive types shared by every record tree the
//! Persistence Port manages: the content-hash type used for `ScanRequest`
//! and `AttackEntry` addressing, and the closed error taxonomy for the
//! storage layer.
//!
//! ## References
//!
//! - NIST FIPS 180-4 for hash size (SHA-256 = 32 bytes)

use thiserror::Error;

/// SHA-256 hash output size in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte SHA-256 hash value, used to content-address `ScanRequest` text
/// and `AttackEntry` bodies.
pub type Hash = [u8; HASH_SIZE];

/// Errors that can occur during persistence operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to open, read, or write the database.
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    /// Failed to serialize or deserialize a record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested record was not found in its tree.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record with this id already exists and the operation requires
    /// immutability (scan requests, risk scores, and attack entries are
    /// write-once).
    #[error("record already exists: {0}")]
    AlreadyExists(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_size_matches_sha256() {
        assert_eq!(HASH_SIZE, 32);
    }

    #[test]
    fn test_error_display() {
        let err = RegistryError::NotFound("scan-123".to_string());
        assert_eq!(err.to_string(), "record not found: scan-123");
    }
}
