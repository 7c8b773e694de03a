//! Document store access for user records.
//!
//! The [`DocumentStore`] trait is the generic find/insert capability this
//! service needs from a document database. [`UserStore`] sits on top of it and
//! is the only thing request handlers talk to: it decodes identifiers, applies
//! a deadline to every store call and turns outcomes into [`crate::Error`]s.
//!
//! Implementations:
//!
//! * [`InMemory`]: process-local store with optional JSON persistence.
//! * [`MongoStore`] (feature `mongodb`): MongoDB via the official driver.

mod errors;
mod in_memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod users;

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::user::{NewUser, User, UserId};

pub use errors::StoreError;
pub use in_memory::InMemory;
#[cfg(feature = "mongodb")]
pub use mongo::{MongoConfig, MongoStore};
pub use users::UserStore;

/// Selects which records a find call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// No predicate.
    All,
    /// Equality on the store-assigned identifier.
    Id(UserId),
    /// Equality on a string field, by stored field name.
    Field { field: String, value: String },
}

impl Filter {
    /// Equality filter on a string field.
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Field {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluates the filter against a record.
    ///
    /// Stores that cannot push predicates down use this directly.
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => user.id == *id,
            Filter::Field { field, value } => user.string_field(field) == Some(value.as_str()),
        }
    }
}

/// Per-operation deadlines applied by [`UserStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// Establishing the store handle at startup.
    pub connect: Duration,
    /// Liveness probe.
    pub ping: Duration,
    /// Find calls.
    pub query: Duration,
    /// Insert calls.
    pub insert: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            ping: Duration::from_secs(2),
            query: Duration::from_secs(5),
            insert: Duration::from_secs(5),
        }
    }
}

/// Generic find/insert capability over the user collection.
///
/// Implementations must be safe to share between concurrently running
/// request tasks. They do not apply deadlines themselves; [`UserStore`] bounds
/// every call it makes.
#[async_trait]
pub trait DocumentStore: Send + Sync + Any {
    /// Short name of the implementation, reported by the health endpoint.
    fn kind(&self) -> &'static str;

    /// Liveness probe against the primary.
    async fn ping(&self) -> Result<()>;

    /// Returns every record matching `filter`, in store order.
    async fn find(&self, filter: &Filter) -> Result<Vec<User>>;

    /// Inserts one record and returns the identifier the store assigned.
    ///
    /// `None` means the store accepted the write but reported no usable
    /// identifier.
    async fn insert_one(&self, user: NewUser) -> Result<Option<UserId>>;

    /// Allows downcasting to the concrete implementation.
    fn as_any(&self) -> &dyn Any;
}
