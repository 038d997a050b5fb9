use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    error::{AppResult, PersonError},
    models::{NewPerson, Person},
    store::{PersonStore, PersonTransaction},
};

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store. The `UNIQUE` constraint on `persons.name` is the only
/// guard against duplicate names; violations surface as `Conflict`.
///
/// Transactions start with `BEGIN IMMEDIATE`, so each one holds the write
/// lock from its first read. Writers on other connections wait for it (up to
/// the busy timeout) instead of failing mid-transaction with `SQLITE_BUSY`.
#[derive(Clone)]
pub struct SqlitePersonStore {
    pool: SqlitePool,
}

impl SqlitePersonStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Each connection to `:memory:` opens a separate database, so an
        // in-memory pool must hold exactly one connection for its whole life.
        let pool_options = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self::new(pool))
    }

    pub async fn in_memory() -> AppResult<Self> {
        Self::connect(IN_MEMORY_URL, 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl PersonStore for SqlitePersonStore {
    async fn init(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn PersonTransaction>> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl PersonTransaction for SqliteTransaction {
    async fn list(&mut self) -> AppResult<Vec<Person>> {
        let persons = sqlx::query_as::<_, Person>("SELECT id, name FROM persons ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(persons)
    }

    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>("SELECT id, name FROM persons WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(person)
    }

    async fn find_by_name(&mut self, name: &str) -> AppResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>("SELECT id, name FROM persons WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(person)
    }

    async fn insert(&mut self, person: NewPerson) -> AppResult<Person> {
        let created = sqlx::query_as::<_, Person>(
            r#"
            INSERT INTO persons (name)
            VALUES (?)
            RETURNING id, name
            "#,
        )
        .bind(person.name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(created)
    }

    async fn save(&mut self, person: &Person) -> AppResult<()> {
        let result = sqlx::query("UPDATE persons SET name = ? WHERE id = ?")
            .bind(&person.name)
            .bind(person.id)
            .execute(&mut *self.tx)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn delete(&mut self, person: &Person) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM persons WHERE id = ?")
            .bind(person.id)
            .execute(&mut *self.tx)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// A write that touched no row lost its target to another transaction.
fn expect_one_row(rows_affected: u64) -> AppResult<()> {
    if rows_affected == 0 {
        return Err(PersonError::not_found());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqlitePersonStore {
        let store = SqlitePersonStore::in_memory()
            .await
            .expect("in-memory sqlite should open");
        store.init().await.expect("migrations should apply");
        store
    }

    fn new_person(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
        }
    }

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:persons?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://persons.db"));
    }

    #[tokio::test]
    async fn init_is_repeatable() {
        let store = store().await;
        store.init().await.expect("second init should be a no-op");
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = store().await;
        let mut tx = store.begin().await.expect("begin should succeed");
        let john = tx
            .insert(new_person("John Doe"))
            .await
            .expect("insert should succeed");
        let jane = tx
            .insert(new_person("Jane Smith"))
            .await
            .expect("insert should succeed");
        tx.commit().await.expect("commit should succeed");

        assert_eq!(john.id, 1);
        assert_eq!(jane.id, 2);

        let mut tx = store.begin().await.expect("begin should succeed");
        let listed = tx.list().await.expect("list should succeed");
        assert_eq!(listed, vec![john, jane]);
    }

    #[tokio::test]
    async fn unique_violation_is_a_conflict() {
        let store = store().await;
        let mut tx = store.begin().await.expect("begin should succeed");
        tx.insert(new_person("Jane Smith"))
            .await
            .expect("insert should succeed");
        let err = tx
            .insert(new_person("Jane Smith"))
            .await
            .expect_err("duplicate insert should fail");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = store().await;
        let mut tx = store.begin().await.expect("begin should succeed");
        tx.insert(new_person("John Doe"))
            .await
            .expect("insert should succeed");
        tx.rollback().await.expect("rollback should succeed");

        let mut tx = store.begin().await.expect("begin should succeed");
        let found = tx
            .find_by_name("John Doe")
            .await
            .expect("lookup should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = store().await;

        let mut tx = store.begin().await.expect("begin should succeed");
        tx.insert(new_person("John Doe"))
            .await
            .expect("insert should succeed");
        let last = tx
            .insert(new_person("Jane Smith"))
            .await
            .expect("insert should succeed");
        tx.delete(&last).await.expect("delete should succeed");
        tx.commit().await.expect("commit should succeed");

        let mut tx = store.begin().await.expect("begin should succeed");
        let next = tx
            .insert(new_person("Mary Ann"))
            .await
            .expect("insert should succeed");
        tx.commit().await.expect("commit should succeed");

        assert!(next.id > last.id);
    }

    #[tokio::test]
    async fn writes_to_a_vanished_row_are_not_found() {
        let store = store().await;
        let mut tx = store.begin().await.expect("begin should succeed");
        let john = tx
            .insert(new_person("John Doe"))
            .await
            .expect("insert should succeed");
        tx.delete(&john).await.expect("delete should succeed");

        let renamed = Person {
            id: john.id,
            name: "Jane Doe".to_string(),
        };
        let err = tx.save(&renamed).await.expect_err("save should fail");
        assert!(matches!(err, PersonError::NotFound(_)), "{err:?}");

        let err = tx.delete(&john).await.expect_err("delete should fail");
        assert!(matches!(err, PersonError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn file_database_serializes_writers() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let url = format!("sqlite://{}", dir.path().join("persons.db").display());
        let store = SqlitePersonStore::connect(&url, 5)
            .await
            .expect("file sqlite should open");
        store.init().await.expect("migrations should apply");

        let mut first = store.begin().await.expect("begin should succeed");
        first
            .insert(new_person("John Doe"))
            .await
            .expect("insert should succeed");

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await?;
                let found = second.find_by_name("John Doe").await?;
                second.commit().await?;
                AppResult::<Option<Person>>::Ok(found)
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        first.commit().await.expect("commit should succeed");

        let found = waiter
            .await
            .expect("task should not panic")
            .expect("second transaction should wait, not fail");
        assert_eq!(found.map(|p| p.name), Some("John Doe".to_string()));
    }
}
