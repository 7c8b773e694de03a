//!
//! drawconnect: an HTTP service storing users and their pen-stroke signatures
//! in a document database.
//!
//! ## Core Concepts
//!
//! * **Users (`user::User`)**: the persisted records. Each carries an email, optional
//!   signature samples and an optional opaque token, plus a store-assigned `user::UserId`.
//! * **Document stores (`store::DocumentStore`)**: a pluggable find/insert capability over the
//!   user collection. `store::MongoStore` talks to MongoDB; `store::InMemory` keeps everything in
//!   process.
//! * **UserStore (`store::UserStore`)**: the data-access layer. It decodes identifiers, bounds
//!   every store call with a deadline and reports failures as [`Error`]s.
//! * **HTTP (`http`)**: the axum router exposing the data-access layer as JSON routes.

pub mod http;
pub mod store;
pub mod user;

pub use store::UserStore;
pub use user::{NewUser, Signature, User, UserId};

/// Result type used throughout the drawconnect library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the drawconnect library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A client-supplied identifier is malformed.
    #[error(transparent)]
    InvalidIdentifier(#[from] user::IdError),

    /// Structured document store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::InvalidIdentifier(_) => "user",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error is a malformed identifier.
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Error::InvalidIdentifier(_))
    }

    /// Check if this error was caused by the client rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.is_invalid_identifier()
    }

    /// Check if the document store is unavailable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }
}
