//! MongoDB document store.
//!
//! Users live in one collection (`drawConnect.user` by default). Documents
//! carry the native `_id` ObjectId, `email`, and optionally `signatures` and
//! `token`.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{ClientOptions, IndexOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

use super::{DocumentStore, Filter, StoreError};
use crate::Result;
use crate::user::{EMAIL_FIELD, NewUser, Signature, User, UserId};

/// Where and how to reach MongoDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
    /// Bounds client construction and the driver's own connect and
    /// server-selection timeouts.
    pub connect_timeout: Duration,
}

impl MongoConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Connection string for this configuration.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            database: "drawConnect".to_string(),
            collection: "user".to_string(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Store-side shape of a user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Documents written before the email field existed used `name`. Only
    /// read when `email` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signatures: Option<Vec<Signature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl From<NewUser> for UserDocument {
    fn from(new: NewUser) -> Self {
        Self {
            id: None,
            email: Some(new.email),
            name: None,
            signatures: new.signatures,
            token: new.token,
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = StoreError;

    fn try_from(document: UserDocument) -> std::result::Result<Self, Self::Error> {
        let id = document.id.ok_or_else(|| StoreError::QueryFailed {
            reason: "document without _id".to_string(),
        })?;
        Ok(User {
            id: id.into(),
            email: document.email.or(document.name).unwrap_or_default(),
            signatures: document.signatures,
            token: document.token,
        })
    }
}

/// Translates a [`Filter`] into a query document.
///
/// Email lookups also match legacy documents that only carry `name`.
fn to_query(filter: &Filter) -> Document {
    match filter {
        Filter::All => doc! {},
        Filter::Id(id) => doc! { "_id": ObjectId::from(*id) },
        Filter::Field { field, value } if field.as_str() == EMAIL_FIELD => doc! {
            "$or": [
                { "email": value.as_str() },
                { "email": { "$exists": false }, "name": value.as_str() }
            ]
        },
        Filter::Field { field, value } => {
            let mut query = Document::new();
            query.insert(field.as_str(), value.as_str());
            query
        }
    }
}

/// Reads the identifier out of an insert acknowledgement.
fn inserted_id(bson: &Bson) -> Option<UserId> {
    match bson {
        Bson::ObjectId(oid) => Some((*oid).into()),
        Bson::String(raw) => UserId::from_marshalled(raw).ok(),
        _ => None,
    }
}

/// Document store backed by a MongoDB deployment.
///
/// The driver's `Client` is a connection pool; one `MongoStore` is shared by
/// every request.
pub struct MongoStore {
    client: Client,
    users: Collection<UserDocument>,
    address: String,
    connect_timeout: Duration,
}

impl MongoStore {
    /// Builds the client for `config`.
    ///
    /// The driver connects lazily, so a reachable deployment is only
    /// confirmed by a subsequent ping.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let address = config.uri();
        let build = async {
            let mut options = ClientOptions::parse(config.uri()).await?;
            options.app_name = Some("drawconnect".to_string());
            options.connect_timeout = Some(config.connect_timeout);
            options.server_selection_timeout = Some(config.connect_timeout);
            Client::with_options(options)
        };

        let client = match tokio::time::timeout(config.connect_timeout, build).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                return Err(StoreError::ConnectFailed {
                    address,
                    reason: e.to_string(),
                }
                .into());
            }
            Err(_) => {
                return Err(StoreError::ConnectFailed {
                    address,
                    reason: format!("timed out after {:?}", config.connect_timeout),
                }
                .into());
            }
        };

        let users = client
            .database(&config.database)
            .collection::<UserDocument>(&config.collection);
        tracing::info!(
            %address,
            database = %config.database,
            collection = %config.collection,
            "MongoDB client ready"
        );

        Ok(Self {
            client,
            users,
            address,
            connect_timeout: config.connect_timeout,
        })
    }

    /// Address this store was built for.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Creates a unique index on `email` if it does not exist yet.
    ///
    /// Runs at startup under the connect deadline; any failure means the
    /// deployment is not usable as configured.
    pub async fn ensure_unique_email_index(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let create = self.users.create_index(index);
        let reason = match tokio::time::timeout(self.connect_timeout, create).await {
            Ok(Ok(_)) => {
                tracing::info!("unique index on email ensured");
                return Ok(());
            }
            Ok(Err(e)) => format!("failed to create unique email index: {e}"),
            Err(_) => format!(
                "creating unique email index timed out after {:?}",
                self.connect_timeout
            ),
        };
        Err(StoreError::ConnectFailed {
            address: self.address.clone(),
            reason,
        }
        .into())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn kind(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await
            .map_err(|e| StoreError::Unreachable {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<User>> {
        let query_failed = |e: mongodb::error::Error| StoreError::QueryFailed {
            reason: e.to_string(),
        };
        let documents: Vec<UserDocument> = self
            .users
            .find(to_query(filter))
            .await
            .map_err(query_failed)?
            .try_collect()
            .await
            .map_err(query_failed)?;

        let users = documents
            .into_iter()
            .map(User::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn insert_one(&self, user: NewUser) -> Result<Option<UserId>> {
        let result = self
            .users
            .insert_one(UserDocument::from(user))
            .await
            .map_err(|e| StoreError::InsertFailed {
                reason: e.to_string(),
            })?;
        Ok(inserted_id(&result.inserted_id))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
