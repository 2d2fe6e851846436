use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::Todo;
use crate::storage::TodoRepository;
use crate::storage::memory::InMemoryTodoRepository;

/// In-memory repository that remembers which methods were called.
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryTodoRepository,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts directly, bypassing handlers, and clears the call log.
    pub async fn seed(&self, todos: impl IntoIterator<Item = Todo>) {
        for todo in todos {
            self.inner.add(todo).await.unwrap();
        }
        self.calls.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TodoRepository for RecordingRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Todo>> {
        self.record("get_by_id");
        self.inner.get_by_id(id).await
    }

    async fn get_all(&self) -> Result<Vec<Todo>> {
        self.record("get_all");
        self.inner.get_all().await
    }

    async fn add(&self, todo: Todo) -> Result<Todo> {
        self.record("add");
        self.inner.add(todo).await
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        self.record("update");
        self.inner.update(todo).await
    }

    async fn delete(&self, todo: &Todo) -> Result<()> {
        self.record("delete");
        self.inner.delete(todo).await
    }

    async fn get_completed(&self) -> Result<Vec<Todo>> {
        self.record("get_completed");
        self.inner.get_completed().await
    }

    async fn get_incomplete(&self) -> Result<Vec<Todo>> {
        self.record("get_incomplete");
        self.inner.get_incomplete().await
    }

    async fn get_due_before(&self, instant: DateTime<Utc>) -> Result<Vec<Todo>> {
        self.record("get_due_before");
        self.inner.get_due_before(instant).await
    }

    async fn get_overdue(&self) -> Result<Vec<Todo>> {
        self.record("get_overdue");
        self.inner.get_overdue().await
    }

    async fn search_by_title(&self, term: &str) -> Result<Vec<Todo>> {
        self.record("search_by_title");
        self.inner.search_by_title(term).await
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        self.record("exists");
        self.inner.exists(id).await
    }
}

/// Every call fails like a lost database connection; `get_all` panics.
pub struct BrokenRepository;

#[async_trait]
impl TodoRepository for BrokenRepository {
    async fn get_by_id(&self, _id: Uuid) -> Result<Option<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn get_all(&self) -> Result<Vec<Todo>> {
        panic!("connection pool poisoned")
    }

    async fn add(&self, _todo: Todo) -> Result<Todo> {
        Err(anyhow!("connection refused"))
    }

    async fn update(&self, _todo: &Todo) -> Result<()> {
        Err(anyhow!("connection refused"))
    }

    async fn delete(&self, _todo: &Todo) -> Result<()> {
        Err(anyhow!("connection refused"))
    }

    async fn get_completed(&self) -> Result<Vec<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn get_incomplete(&self) -> Result<Vec<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn get_due_before(&self, _instant: DateTime<Utc>) -> Result<Vec<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn get_overdue(&self) -> Result<Vec<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn search_by_title(&self, _term: &str) -> Result<Vec<Todo>> {
        Err(anyhow!("connection refused"))
    }

    async fn exists(&self, _id: Uuid) -> Result<bool> {
        Err(anyhow!("connection refused"))
    }
}
