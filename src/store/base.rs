use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{memory_store::MemoryStore, mongodb_store::MongoDBStore};
use crate::config::StoreConfig;
use crate::models::{Order, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// The OrderStore trait abstracts persistence for orders and users.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError>;
    /// Returns at most `limit` orders, in storage order.
    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    /// Fails with `Conflict` if the email is already registered.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    fn backend_name(&self) -> &str;
}

/// Creates a concrete store implementation based on the StoreConfig.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn OrderStore>, StoreError> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory order store.");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::MongoDB(mongo_config) => {
            let store = MongoDBStore::new(mongo_config).await?;
            info!("Successfully created MongoDB store.");
            Ok(Arc::new(store))
        }
    }
}
