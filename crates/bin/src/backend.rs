//! Document store creation.

use std::sync::Arc;

use drawconnect::{
    UserStore,
    store::{DocumentStore, InMemory},
};

use crate::cli::{Backend, BackendArgs};

/// Create the document store selected by the configuration and wrap it in a
/// [`UserStore`] with the configured deadlines.
pub async fn create_user_store(
    args: &BackendArgs,
) -> Result<UserStore, Box<dyn std::error::Error>> {
    let store: Arc<dyn DocumentStore> = match args.backend {
        Backend::Mongodb => connect_mongodb(args).await?,
        Backend::Inmemory => {
            let path = args.data_file();
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                path.display()
            );
            let store = InMemory::load_from_file(&path).await?;
            if store.is_empty().await {
                tracing::info!("Starting with an empty collection");
            } else {
                tracing::info!(users = store.len().await, "Loaded existing data");
            }
            Arc::new(store.with_unique_email(args.unique_email))
        }
    };

    Ok(UserStore::with_deadlines(store, args.deadlines()))
}

#[cfg(feature = "mongodb")]
async fn connect_mongodb(
    args: &BackendArgs,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    use drawconnect::store::{MongoConfig, MongoStore};

    let config = MongoConfig {
        host: args.db_host.clone(),
        port: args.db_port,
        database: args.db_name.clone(),
        collection: args.collection.clone(),
        connect_timeout: args.deadlines().connect,
    };
    tracing::info!("Connecting to MongoDB at {}", config.uri());
    let store = MongoStore::connect(&config).await?;
    if args.unique_email {
        store.ensure_unique_email_index().await?;
    }
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongodb(
    _args: &BackendArgs,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    Err("this build has no MongoDB support; rebuild with the `mongodb` feature or use --backend inmemory".into())
}
