//! In-memory document store
//!
//! Suitable for testing, development, or deployments where losing data on a
//! crash is acceptable. State can be saved to and loaded from a JSON file.

mod persistence;

use std::any::Any;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, Filter, StoreError};
use crate::Result;
use crate::user::{NewUser, User, UserId};

/// A document store holding users in insertion order.
///
/// Identifiers are generated locally with [`UserId::generate`]. Lookups scan
/// the whole collection.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) users: RwLock<Vec<User>>,
    pub(crate) unique_email: bool,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects inserts whose email is already present.
    pub fn with_unique_email(mut self, unique: bool) -> Self {
        self.unique_email = unique;
        self
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Saves every user to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store previously written by [`InMemory::save_to_file`].
    ///
    /// A missing file yields an empty store.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl DocumentStore for InMemory {
    fn kind(&self) -> &'static str {
        "inmemory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| filter.matches(u)).cloned().collect())
    }

    async fn insert_one(&self, user: NewUser) -> Result<Option<UserId>> {
        let mut users = self.users.write().await;
        if self.unique_email && users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::InsertFailed {
                reason: format!("duplicate email {:?}", user.email),
            }
            .into());
        }
        let id = UserId::generate();
        users.push(User::from_new(id, user));
        Ok(Some(id))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
