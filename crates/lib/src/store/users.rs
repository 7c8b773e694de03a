//! The data-access layer over a [`DocumentStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{Deadlines, DocumentStore, Filter, StoreError};
use crate::Result;
use crate::user::{EMAIL_FIELD, NewUser, User, UserId};

/// Bounded-deadline access to the user collection.
///
/// Cloning is cheap; every clone shares the same store handle. Each method
/// issues at most one store call, under the matching deadline from
/// [`Deadlines`]. When the deadline expires the in-flight call is dropped and
/// a timeout error is returned. There are no retries.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
    deadlines: Deadlines,
}

impl UserStore {
    /// Wraps a store handle with the default deadlines.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_deadlines(store, Deadlines::default())
    }

    pub fn with_deadlines(store: Arc<dyn DocumentStore>, deadlines: Deadlines) -> Self {
        Self { store, deadlines }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn deadlines(&self) -> Deadlines {
        self.deadlines
    }

    /// Probes the store.
    ///
    /// Any failure, including an expired deadline, is reported as
    /// [`StoreError::Unreachable`].
    pub async fn check_connectivity(&self) -> Result<()> {
        let limit = self.deadlines.ping;
        tracing::debug!(store = self.store.kind(), "check_connectivity");
        match tokio::time::timeout(limit, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "check_connectivity failed");
                Err(StoreError::Unreachable {
                    reason: e.to_string(),
                }
                .into())
            }
            Err(_) => {
                tracing::warn!(?limit, "check_connectivity timed out");
                Err(StoreError::Unreachable {
                    reason: format!("no answer within {limit:?}"),
                }
                .into())
            }
        }
    }

    /// Returns every user. An empty collection yields an empty vector.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        bounded("list_all", self.deadlines.query, self.store.find(&Filter::All)).await
    }

    /// Looks a user up by the external form of its identifier.
    ///
    /// The identifier is decoded before any store call, so a malformed one
    /// never causes a round trip. Returns zero or one user.
    pub async fn find_by_id(&self, id: &str) -> Result<Vec<User>> {
        let id = UserId::decode(id).inspect_err(|e| {
            tracing::debug!(error = %e, "find_by_id rejected identifier");
        })?;
        bounded("find_by_id", self.deadlines.query, self.store.find(&Filter::Id(id))).await
    }

    /// Looks a user up by email.
    ///
    /// Emails are expected to be unique; more than one match is reported as
    /// [`StoreError::MultipleMatches`] instead of returning any of them.
    pub async fn find_by_email(&self, email: &str) -> Result<Vec<User>> {
        let filter = Filter::field(EMAIL_FIELD, email);
        let users = bounded("find_by_email", self.deadlines.query, self.store.find(&filter)).await?;
        if users.len() > 1 {
            tracing::warn!(count = users.len(), "find_by_email matched several users");
            return Err(StoreError::MultipleMatches {
                field: EMAIL_FIELD.to_string(),
                value: email.to_string(),
                count: users.len(),
            }
            .into());
        }
        Ok(users)
    }

    /// Creates a user and returns its store-assigned identifier.
    pub async fn insert(&self, user: NewUser) -> Result<UserId> {
        let id = bounded("insert", self.deadlines.insert, self.store.insert_one(user)).await?;
        match id {
            Some(id) => {
                tracing::info!(%id, "inserted user");
                Ok(id)
            }
            None => {
                tracing::warn!("insert returned no identifier");
                Err(StoreError::NoIdentifierAssigned.into())
            }
        }
    }
}

/// Runs one store call under `limit`.
///
/// The timer and the call live only for the duration of this function, so
/// both are released on success, failure and expiry alike.
async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tracing::debug!(operation, ?limit, "store call");
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(operation, error = %e, "store call failed");
            Err(e)
        }
        Err(_) => {
            tracing::warn!(operation, ?limit, "store call timed out");
            Err(StoreError::Timeout {
                operation,
                timeout: limit,
            }
            .into())
        }
    }
}
