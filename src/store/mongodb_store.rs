use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Order, User};
use crate::store::{OrderStore, StoreError};

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// The config struct for MongoDB connections.
/// Contains the URI and database name.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: String,
}

/// A concrete `OrderStore` implementation that uses MongoDB.
///
/// Orders and users are stored as-is in the `orders` and `users`
/// collections, keyed by unique indexes on `id` and `email`.
pub struct MongoDBStore {
    order_collection: Collection<Order>,
    user_collection: Collection<User>,
}

impl MongoDBStore {
    /// Creates a new `MongoDBStore` from the given config.
    /// It initializes client connections and sets up indexes.
    pub async fn new(config: &MongoDBConfig) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB database '{}'", config.database);

        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to parse MongoDB URI: {}", e)))?;
        client_options.app_name = Some("orderpulse".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| StoreError::Backend(format!("Failed to create MongoDB client: {}", e)))?;

        let database = client.database(&config.database);
        let order_collection = database.collection::<Order>("orders");
        let user_collection = database.collection::<User>("users");

        let mut unique_on_order_id = IndexModel::default();
        unique_on_order_id.keys = doc! { "id": 1 };
        unique_on_order_id.options = Some(IndexOptions::builder().unique(true).build());
        order_collection
            .create_index(unique_on_order_id, None)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to create index on order id: {}", e)))?;

        let mut unique_on_email = IndexModel::default();
        unique_on_email.keys = doc! { "email": 1 };
        unique_on_email.options = Some(IndexOptions::builder().unique(true).build());
        user_collection
            .create_index(unique_on_email, None)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to create index on email: {}", e)))?;

        info!("MongoDB connection established successfully.");
        Ok(Self {
            order_collection,
            user_collection,
        })
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn map_write_error(error: mongodb::error::Error, conflict: &str) -> StoreError {
    if is_duplicate_key(&error) {
        StoreError::Conflict(conflict.to_string())
    } else {
        StoreError::Backend(error.to_string())
    }
}

fn backend(error: mongodb::error::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

#[async_trait]
impl OrderStore for MongoDBStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        debug!("Inserting order {}", order.id);
        self.order_collection
            .insert_one(order, None)
            .await
            .map(|_| ())
            .map_err(|e| map_write_error(e, "order already exists"))
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let options = FindOptions::builder().limit(limit).build();
        let cursor = self
            .order_collection
            .find(doc! {}, options)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        self.order_collection
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(backend)
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.user_collection
            .insert_one(user, None)
            .await
            .map(|_| ())
            .map_err(|e| map_write_error(e, "email already registered"))
    }

    fn backend_name(&self) -> &str {
        "mongo"
    }
}
