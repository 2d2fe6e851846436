pub mod memory;
#[cfg(feature = "storage")]
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::config::AppConfig;
use crate::core::Todo;

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Todo>>;
    async fn get_all(&self) -> anyhow::Result<Vec<Todo>>;
    async fn add(&self, todo: Todo) -> anyhow::Result<Todo>;
    async fn update(&self, todo: &Todo) -> anyhow::Result<()>;
    async fn delete(&self, todo: &Todo) -> anyhow::Result<()>;
    async fn get_completed(&self) -> anyhow::Result<Vec<Todo>>;
    async fn get_incomplete(&self) -> anyhow::Result<Vec<Todo>>;
    /// Items with a due date strictly before `instant`.
    async fn get_due_before(&self, instant: DateTime<Utc>) -> anyhow::Result<Vec<Todo>>;
    /// Incomplete items whose due date has passed.
    async fn get_overdue(&self) -> anyhow::Result<Vec<Todo>>;
    /// Case-insensitive substring match on the title.
    async fn search_by_title(&self, term: &str) -> anyhow::Result<Vec<Todo>>;
    async fn exists(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Picks the repository named by `config`: in-memory, or the SQLite database at `database_url`.
pub async fn open_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn TodoRepository>> {
    if config.in_memory {
        tracing::info!("Using in-memory todo repository");
        return Ok(Arc::new(memory::InMemoryTodoRepository::new()));
    }
    #[cfg(feature = "storage")]
    {
        let repository = sqlite::SqliteTodoRepository::connect(&config.database_url).await?;
        Ok(Arc::new(repository))
    }
    #[cfg(not(feature = "storage"))]
    {
        anyhow::bail!("built without the `storage` feature; set TODO_IN_MEMORY=true")
    }
}
