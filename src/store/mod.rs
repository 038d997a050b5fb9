//! Persistence seam for person records.
//!
//! Every read and write goes through a [`PersonTransaction`] obtained from a
//! [`PersonStore`]. The transaction is consumed by `commit` or `rollback`;
//! dropping it without either discards its changes.
//!
//! Name uniqueness is the store's job. `insert`, `save` and `commit` report a
//! violation as [`PersonError::Conflict`](crate::error::PersonError::Conflict)
//! and any other failure as `Storage`. A `save`, `delete` or `commit` whose
//! row was removed by a concurrent transaction fails with `NotFound` rather
//! than silently touching nothing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{
    config::{AppConfig, StoreBackend},
    error::AppResult,
    models::{NewPerson, Person},
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryPersonStore;
pub use sqlite::SqlitePersonStore;

#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Creates the schema if it does not exist yet.
    async fn init(&self) -> AppResult<()>;
    async fn begin(&self) -> AppResult<Box<dyn PersonTransaction>>;
}

#[async_trait]
pub trait PersonTransaction: Send {
    async fn list(&mut self) -> AppResult<Vec<Person>>;
    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<Person>>;
    async fn find_by_name(&mut self, name: &str) -> AppResult<Option<Person>>;
    /// Stores a new record and returns it with its assigned id.
    async fn insert(&mut self, person: NewPerson) -> AppResult<Person>;
    async fn save(&mut self, person: &Person) -> AppResult<()>;
    async fn delete(&mut self, person: &Person) -> AppResult<()>;
    async fn commit(self: Box<Self>) -> AppResult<()>;
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Opens the configured backend and applies its schema.
pub async fn open(config: &AppConfig) -> AppResult<Arc<dyn PersonStore>> {
    let store: Arc<dyn PersonStore> = match config.store_backend {
        StoreBackend::Sqlite => {
            info!(url = %config.database_url, "person store: sqlite");
            Arc::new(
                SqlitePersonStore::connect(&config.database_url, config.db_max_connections)
                    .await?,
            )
        }
        StoreBackend::Memory => {
            info!("person store: memory");
            Arc::new(MemoryPersonStore::new())
        }
    };

    store.init().await?;
    Ok(store)
}
