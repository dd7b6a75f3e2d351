pub mod base;
pub mod instrumented_store;
pub mod memory_store;
pub mod mongodb_store;

// Re-export the primary Store items so code outside can do
// "use crate::store::{OrderStore, create_store};"
pub use base::{create_store, OrderStore, StoreError};
pub use instrumented_store::InstrumentedStore;
pub use mongodb_store::MongoDBConfig;
