use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::Todo;

use super::TodoRepository;

/// Map-backed repository. Results are ordered by creation time.
#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<HashMap<Uuid, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(&self, keep: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        let todos = self.todos.read().await;
        let mut matched: Vec<Todo> = todos.values().filter(|t| keep(t)).cloned().collect();
        matched.sort_by_key(|t| t.created_at());
        matched
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Todo>> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Todo>> {
        Ok(self.select(|_| true).await)
    }

    async fn add(&self, todo: Todo) -> Result<Todo> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id()) {
            return Err(anyhow!("todo {} already exists", todo.id()));
        }
        todos.insert(todo.id(), todo.clone());
        Ok(todo)
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        let mut todos = self.todos.write().await;
        let slot = todos
            .get_mut(&todo.id())
            .ok_or_else(|| anyhow!("todo {} disappeared before update", todo.id()))?;
        *slot = todo.clone();
        Ok(())
    }

    async fn delete(&self, todo: &Todo) -> Result<()> {
        self.todos
            .write()
            .await
            .remove(&todo.id())
            .map(|_| ())
            .ok_or_else(|| anyhow!("todo {} disappeared before delete", todo.id()))
    }

    async fn get_completed(&self) -> Result<Vec<Todo>> {
        Ok(self.select(|t| t.is_completed()).await)
    }

    async fn get_incomplete(&self) -> Result<Vec<Todo>> {
        Ok(self.select(|t| !t.is_completed()).await)
    }

    async fn get_due_before(&self, instant: DateTime<Utc>) -> Result<Vec<Todo>> {
        Ok(self.select(|t| t.due_date().is_some_and(|due| due < instant)).await)
    }

    async fn get_overdue(&self) -> Result<Vec<Todo>> {
        let now = Utc::now();
        Ok(self.select(|t| t.is_overdue_at(now)).await)
    }

    async fn search_by_title(&self, term: &str) -> Result<Vec<Todo>> {
        let needle = term.to_lowercase();
        Ok(self.select(|t| t.title().to_lowercase().contains(&needle)).await)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.todos.read().await.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn filtered_reads() {
        let repo = InMemoryTodoRepository::new();
        let now = Utc::now();
        let mut done = Todo::new("Write REPORT", None, Some(now - Duration::days(1))).unwrap();
        done.mark_complete();
        let late = Todo::new("Pay rent", None, Some(now - Duration::days(2))).unwrap();
        let later = Todo::new("Book flights", None, Some(now + Duration::days(3))).unwrap();
        for todo in [done.clone(), late.clone(), later.clone()] {
            repo.add(todo).await.unwrap();
        }

        assert_eq!(repo.get_all().await.unwrap().len(), 3);
        assert_eq!(repo.get_completed().await.unwrap(), vec![done.clone()]);
        assert_eq!(repo.get_incomplete().await.unwrap().len(), 2);
        assert_eq!(repo.get_overdue().await.unwrap(), vec![late.clone()]);
        assert_eq!(repo.get_due_before(now).await.unwrap().len(), 2);
        assert_eq!(repo.search_by_title("report").await.unwrap(), vec![done.clone()]);
        assert!(repo.exists(later.id()).await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_row_fail() {
        let repo = InMemoryTodoRepository::new();
        let ghost = Todo::new("Ghost", None, None).unwrap();
        assert!(repo.update(&ghost).await.is_err());
        assert!(repo.delete(&ghost).await.is_err());
        assert!(!repo.exists(ghost.id()).await.unwrap());
    }
}
