use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, migrate::MigrateDatabase};
use uuid::Uuid;

use crate::core::Todo;
use crate::storage::TodoRepository;
use crate::telemetry::events;

const COLUMNS: &str = "id, title, description, is_completed, due_date, created_at, updated_at";

#[derive(FromRow)]
struct TodoRow {
    id: String,
    title: String,
    description: Option<String>,
    is_completed: bool,
    due_date: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<TodoRow> for Todo {
    type Error = anyhow::Error;

    fn try_from(row: TodoRow) -> Result<Self> {
        Ok(Todo::restore(
            Uuid::parse_str(&row.id).with_context(|| format!("bad todo id {:?}", row.id))?,
            row.title,
            row.description,
            row.is_completed,
            row.due_date.map(from_micros).transpose()?,
            from_micros(row.created_at)?,
            from_micros(row.updated_at)?,
        ))
    }
}

// Timestamps are stored as UTC microseconds so SQL comparisons are numeric.
fn to_micros(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_micros()
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("timestamp {micros} out of range"))
}

// SQLite's LIKE only folds ASCII, so search runs against a Unicode-lowercased copy.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    /// Opens (creating if missing) the database at `url` and ensures the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            tracing::info!(url = %url, "Creating database");
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("failed to create database {url}"))?;
        }
        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("failed to open database {url}"))?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database; one connection so every query sees the same data.
    pub async fn new_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<Todo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Todo::try_from).collect()
    }
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS todos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL CHECK (length(title) <= 255),
            title_folded TEXT NOT NULL,
            description TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            due_date INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("failed to create todos table")?;
    tracing::info!(
        event_id = events::DATABASE_MIGRATED.id,
        event = events::DATABASE_MIGRATED.name,
        "Database schema ready"
    );
    Ok(())
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Todo>> {
        let row: Option<TodoRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Todo::try_from).transpose()
    }

    async fn get_all(&self) -> Result<Vec<Todo>> {
        self.fetch(&format!("SELECT {COLUMNS} FROM todos ORDER BY created_at")).await
    }

    async fn add(&self, todo: Todo) -> Result<Todo> {
        sqlx::query(&format!("INSERT INTO todos ({COLUMNS}, title_folded) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"))
            .bind(todo.id().to_string())
            .bind(todo.title())
            .bind(todo.description())
            .bind(todo.is_completed())
            .bind(todo.due_date().map(to_micros))
            .bind(to_micros(todo.created_at()))
            .bind(to_micros(todo.updated_at()))
            .bind(fold(todo.title()))
            .execute(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        let result = sqlx::query(
            "UPDATE todos
             SET title = ?, title_folded = ?, description = ?, is_completed = ?, due_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(todo.title())
        .bind(fold(todo.title()))
        .bind(todo.description())
        .bind(todo.is_completed())
        .bind(todo.due_date().map(to_micros))
        .bind(to_micros(todo.updated_at()))
        .bind(todo.id().to_string())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("todo {} disappeared before update", todo.id()));
        }
        Ok(())
    }

    async fn delete(&self, todo: &Todo) -> Result<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(todo.id().to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("todo {} disappeared before delete", todo.id()));
        }
        Ok(())
    }

    async fn get_completed(&self) -> Result<Vec<Todo>> {
        self.fetch(&format!("SELECT {COLUMNS} FROM todos WHERE is_completed = 1 ORDER BY created_at"))
            .await
    }

    async fn get_incomplete(&self) -> Result<Vec<Todo>> {
        self.fetch(&format!("SELECT {COLUMNS} FROM todos WHERE is_completed = 0 ORDER BY created_at"))
            .await
    }

    async fn get_due_before(&self, instant: DateTime<Utc>) -> Result<Vec<Todo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM todos WHERE due_date IS NOT NULL AND due_date < ? ORDER BY created_at"
        ))
        .bind(to_micros(instant))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn get_overdue(&self) -> Result<Vec<Todo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM todos
             WHERE is_completed = 0 AND due_date IS NOT NULL AND due_date < ?
             ORDER BY created_at"
        ))
        .bind(to_micros(Utc::now()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn search_by_title(&self, term: &str) -> Result<Vec<Todo>> {
        let pattern = format!("%{}%", escape_like(&fold(term)));
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM todos WHERE title_folded LIKE ? ESCAPE '\\' ORDER BY created_at"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
