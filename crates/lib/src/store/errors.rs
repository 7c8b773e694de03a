//! Error types for document store operations.
//!
//! Every failure the data-access layer can surface, apart from malformed
//! identifiers (see [`crate::user::IdError`]), is one of these variants.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the document store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store handle could not be established.
    #[error("Failed to connect to document store at {address}: {reason}")]
    ConnectFailed {
        /// Address that was dialed
        address: String,
        /// Driver-provided reason
        reason: String,
    },

    /// The liveness probe failed or did not answer in time.
    #[error("Document store unreachable: {reason}")]
    Unreachable {
        /// Why the probe failed
        reason: String,
    },

    /// A find call failed in transport or while decoding results.
    #[error("Query failed: {reason}")]
    QueryFailed {
        /// Driver-provided reason
        reason: String,
    },

    /// An insert call failed.
    #[error("Insert failed: {reason}")]
    InsertFailed {
        /// Driver-provided reason
        reason: String,
    },

    /// A store call did not complete within its deadline and was cancelled.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The data-access operation that was cancelled
        operation: &'static str,
        /// The deadline that expired
        timeout: Duration,
    },

    /// More than one record matched a lookup on a field expected to be unique.
    #[error("{count} users match {field} = {value:?}, expected at most one")]
    MultipleMatches {
        /// Field that was filtered on
        field: String,
        /// Value that was filtered on
        value: String,
        /// Number of matching records
        count: usize,
    },

    /// The store accepted an insert but returned no usable identifier.
    #[error("No identifier returned for inserted document")]
    NoIdentifierAssigned,

    /// Serializing the in-memory store failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserializing a persisted in-memory store failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error while persisting the in-memory store.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Check if the store is unavailable (fatal at startup, transient per request).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectFailed { .. } | StoreError::Unreachable { .. }
        )
    }

    /// Check if a deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }

    /// Check if stored data broke an expected invariant.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            StoreError::MultipleMatches { .. } | StoreError::NoIdentifierAssigned
        )
    }

    /// Check if this error came from persisting the in-memory store.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
        )
    }

    /// The operation name for timeout errors.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            StoreError::Timeout { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
