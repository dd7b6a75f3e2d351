use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{OrderStore, StoreError};
use crate::metrics::table::DATABASE_QUERY_DURATION_SECONDS;
use crate::metrics::{LabelKey, LabelSet, MetricSample, Telemetry};
use crate::models::{Order, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Get,
    Insert,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Insert => "insert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Orders,
    Users,
}

impl Collection {
    fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Users => "users",
        }
    }
}

/// Wraps any `OrderStore` and observes the duration of every call,
/// successful or not, in `database_query_duration_seconds`.
pub struct InstrumentedStore {
    inner: Arc<dyn OrderStore>,
    telemetry: Telemetry,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn OrderStore>, telemetry: Telemetry) -> Self {
        InstrumentedStore { inner, telemetry }
    }

    async fn timed<T, F>(&self, operation: Operation, collection: Collection, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let result = call.await;
        self.telemetry.emit(MetricSample::observe(
            &DATABASE_QUERY_DURATION_SECONDS,
            LabelSet::new()
                .with(LabelKey::Operation, operation.as_str())
                .with(LabelKey::Collection, collection.as_str()),
            started.elapsed().as_secs_f64(),
        ));
        result
    }
}

#[async_trait]
impl OrderStore for InstrumentedStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        self.timed(
            Operation::Insert,
            Collection::Orders,
            self.inner.create_order(order),
        )
        .await
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        self.timed(
            Operation::List,
            Collection::Orders,
            self.inner.list_orders(limit),
        )
        .await
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        self.timed(Operation::Get, Collection::Orders, self.inner.get_order(id))
            .await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.timed(
            Operation::Insert,
            Collection::Users,
            self.inner.create_user(user),
        )
        .await
    }

    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }
}
