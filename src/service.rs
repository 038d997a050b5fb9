//! List/create/read/update/delete over the person store.
//!
//! Each operation runs in exactly one store transaction. The transaction is
//! committed when the operation succeeds and rolled back on every error path,
//! so a rejected write never leaves partial state behind. Name uniqueness is
//! never pre-checked here: concurrent writers are arbitrated by the store at
//! commit.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{AppResult, PersonError},
    models::{Person, PersonPayload},
    resolver::resolve,
    store::{PersonStore, PersonTransaction},
};

#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
}

impl PersonService {
    pub fn new(store: Arc<dyn PersonStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Person>> {
        let mut tx = self.store.begin().await?;
        let result = tx.list().await;
        finish(tx, result).await
    }

    pub async fn create(&self, payload: PersonPayload) -> AppResult<Person> {
        let new_person = payload.into_new_person()?;

        let mut tx = self.store.begin().await?;
        let result = tx.insert(new_person).await;
        let created = finish(tx, result).await?;

        info!(id = created.id, name = %created.name, "person created");
        Ok(created)
    }

    pub async fn get(&self, token: &str) -> AppResult<Person> {
        let mut tx = self.store.begin().await?;
        let result = resolve(tx.as_mut(), token).await;
        finish(tx, result).await?.ok_or_else(PersonError::not_found)
    }

    pub async fn update(&self, token: &str, payload: PersonPayload) -> AppResult<Person> {
        let mut tx = self.store.begin().await?;
        let result = Self::rename(tx.as_mut(), token, payload).await;
        let updated = finish(tx, result).await?;

        info!(id = updated.id, name = %updated.name, "person updated");
        Ok(updated)
    }

    pub async fn delete(&self, token: &str) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let result = Self::remove(tx.as_mut(), token).await;
        let deleted = finish(tx, result).await?;

        info!(id = deleted.id, name = %deleted.name, "person deleted");
        Ok(())
    }

    async fn rename(
        tx: &mut dyn PersonTransaction,
        token: &str,
        payload: PersonPayload,
    ) -> AppResult<Person> {
        let mut person = resolve(&mut *tx, token)
            .await?
            .ok_or_else(PersonError::not_found)?;
        let renamed = payload.into_new_person()?;

        person.name = renamed.name;
        tx.save(&person).await?;
        Ok(person)
    }

    async fn remove(tx: &mut dyn PersonTransaction, token: &str) -> AppResult<Person> {
        let person = resolve(&mut *tx, token)
            .await?
            .ok_or_else(PersonError::not_found)?;

        tx.delete(&person).await?;
        Ok(person)
    }
}

/// Commits `tx` when `result` is a success, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
async fn finish<T>(tx: Box<dyn PersonTransaction>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed after {err}");
            }
            Err(err)
        }
    }
}
