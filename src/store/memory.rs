use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{AppResult, PersonError},
    models::{NewPerson, Person},
    store::{PersonStore, PersonTransaction},
};

/// A buffered write, replayed against the committed rows at commit time.
#[derive(Debug, Clone)]
enum Change {
    Insert(Person),
    Update(Person),
    Delete(i64),
}

impl Change {
    fn id(&self) -> i64 {
        match self {
            Change::Insert(person) | Change::Update(person) => person.id,
            Change::Delete(id) => *id,
        }
    }

    /// The row as this change leaves it; `None` once deleted.
    fn row(&self) -> Option<&Person> {
        match self {
            Change::Insert(person) | Change::Update(person) => Some(person),
            Change::Delete(_) => None,
        }
    }
}

/// Committed rows, indexed by id and by name.
#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<i64, Person>,
    by_name: HashMap<String, i64>,
}

impl Rows {
    fn remove(&mut self, id: i64) {
        if let Some(person) = self.by_id.remove(&id) {
            self.by_name.remove(&person.name);
        }
    }

    fn put(&mut self, person: Person) {
        self.by_name.insert(person.name.clone(), person.id);
        self.by_id.insert(person.id, person);
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: RwLock<Rows>,
    last_id: AtomicI64,
}

/// In-process store with read-committed visibility.
///
/// Writes are buffered per transaction and applied under one write lock at
/// commit, where the name uniqueness constraint is checked against the
/// committed rows. Ids come from a monotonic counter and are never reused,
/// even when the inserting transaction rolls back.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersonStore {
    table: Arc<Table>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn init(&self) -> AppResult<()> {
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn PersonTransaction>> {
        Ok(Box::new(MemoryTransaction {
            table: Arc::clone(&self.table),
            changes: Vec::new(),
        }))
    }
}

pub struct MemoryTransaction {
    table: Arc<Table>,
    changes: Vec<Change>,
}

impl MemoryTransaction {
    /// Final state of every row this transaction touched, keyed by id.
    fn pending(&self) -> HashMap<i64, Option<&Person>> {
        self.changes
            .iter()
            .map(|change| (change.id(), change.row()))
            .collect()
    }

    fn inserted(&self) -> HashSet<i64> {
        self.changes
            .iter()
            .filter_map(|change| match change {
                Change::Insert(person) => Some(person.id),
                _ => None,
            })
            .collect()
    }

    /// Rejects changes to rows that a concurrent commit removed, and names
    /// that would collide with a committed row or with each other.
    fn check(&self, rows: &Rows, pending: &HashMap<i64, Option<&Person>>) -> AppResult<()> {
        let inserted = self.inserted();
        if pending
            .keys()
            .any(|id| !inserted.contains(id) && !rows.by_id.contains_key(id))
        {
            return Err(PersonError::not_found());
        }

        let mut names = HashSet::with_capacity(pending.len());
        for person in pending.values().flatten() {
            if !names.insert(person.name.as_str()) {
                return Err(PersonError::duplicate_name());
            }
            let taken = rows
                .by_name
                .get(&person.name)
                .is_some_and(|owner| *owner != person.id && !pending.contains_key(owner));
            if taken {
                return Err(PersonError::duplicate_name());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PersonTransaction for MemoryTransaction {
    async fn list(&mut self) -> AppResult<Vec<Person>> {
        let mut rows = self.table.rows.read().await.by_id.clone();
        for (id, row) in self.pending() {
            match row {
                Some(person) => rows.insert(id, person.clone()),
                None => rows.remove(&id),
            };
        }
        Ok(rows.into_values().collect())
    }

    async fn find_by_id(&mut self, id: i64) -> AppResult<Option<Person>> {
        if let Some(change) = self.changes.iter().rev().find(|change| change.id() == id) {
            return Ok(change.row().cloned());
        }
        Ok(self.table.rows.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_name(&mut self, name: &str) -> AppResult<Option<Person>> {
        let pending = self.pending();
        if let Some(person) = pending.values().flatten().find(|person| person.name == name) {
            return Ok(Some((*person).clone()));
        }

        // A committed row this transaction touched no longer carries `name`.
        let rows = self.table.rows.read().await;
        Ok(rows
            .by_name
            .get(name)
            .filter(|id| !pending.contains_key(*id))
            .and_then(|id| rows.by_id.get(id))
            .cloned())
    }

    async fn insert(&mut self, person: NewPerson) -> AppResult<Person> {
        let id = self.table.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Person {
            id,
            name: person.name,
        };
        self.changes.push(Change::Insert(created.clone()));
        Ok(created)
    }

    async fn save(&mut self, person: &Person) -> AppResult<()> {
        self.changes.push(Change::Update(person.clone()));
        Ok(())
    }

    async fn delete(&mut self, person: &Person) -> AppResult<()> {
        self.changes.push(Change::Delete(person.id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        if self.changes.is_empty() {
            return Ok(());
        }

        let mut rows = self.table.rows.write().await;
        let pending = self.pending();
        self.check(&rows, &pending)?;

        // Clear every touched row first so swapped names never collide.
        for id in pending.keys() {
            rows.remove(*id);
        }
        for person in pending.into_values().flatten() {
            rows.put(person.clone());
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
