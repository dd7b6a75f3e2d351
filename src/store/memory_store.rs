use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{OrderStore, StoreError};
use crate::models::{Order, User};

#[derive(Default)]
struct MemoryState {
    orders: Vec<Order>,
    order_index: HashMap<String, usize>,
    users_by_email: HashMap<String, User>,
}

/// A process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.order_index.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} exists", order.id)));
        }
        let position = state.orders.len();
        state.order_index.insert(order.id.clone(), position);
        state.orders.push(order.clone());
        Ok(())
    }

    async fn list_orders(&self, limit: usize) -> Result<Vec<Order>, StoreError> {
        Ok(self.read()?.orders.iter().take(limit).cloned().collect())
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let state = self.read()?;
        Ok(state
            .order_index
            .get(id)
            .and_then(|&i| state.orders.get(i))
            .cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users_by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        state
            .users_by_email
            .insert(user.email.clone(), user.clone());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
