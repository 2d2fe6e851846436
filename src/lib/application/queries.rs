use std::sync::Arc;

use tracing::{debug, field, instrument, warn};
use uuid::Uuid;

use crate::application::dto::{TodoDto, TodoFilter, TodoSelection};
use crate::core::{AppError, Outcome, not_found};
use crate::storage::TodoRepository;
use crate::telemetry::events;

#[derive(Debug, Clone, Copy)]
pub struct GetTodoById {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct GetTodos {
    pub filter: Option<TodoFilter>,
}

pub struct GetTodoByIdHandler<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: TodoRepository + ?Sized> GetTodoByIdHandler<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(name = "get_todo_by_id", skip_all, fields(todo.id = %query.id))]
    pub async fn handle(&self, query: GetTodoById) -> Result<Outcome<TodoDto>, AppError> {
        match self.repository.get_by_id(query.id).await? {
            Some(todo) => Ok(Outcome::Success(TodoDto::from(&todo))),
            None => {
                warn!(
                    event_id = events::TODO_NOT_FOUND.id,
                    event = events::TODO_NOT_FOUND.name,
                    todo_id = %query.id,
                    "Todo not found"
                );
                Ok(Outcome::failure(not_found(query.id)))
            }
        }
    }
}

/// Never fails on an empty result; exactly one repository read per call.
pub struct GetTodosHandler<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: TodoRepository + ?Sized> GetTodosHandler<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(name = "get_todos", skip_all, fields(todo.count = field::Empty))]
    pub async fn handle(&self, query: GetTodos) -> Result<Outcome<Vec<TodoDto>>, AppError> {
        let selection = TodoSelection::from_filter(query.filter.as_ref());
        debug!(?selection, "listing todos");
        let todos = match selection {
            TodoSelection::Completed => self.repository.get_completed().await?,
            TodoSelection::Incomplete => self.repository.get_incomplete().await?,
            TodoSelection::DueBefore(instant) => self.repository.get_due_before(instant).await?,
            TodoSelection::Overdue => self.repository.get_overdue().await?,
            TodoSelection::Search(term) => self.repository.search_by_title(&term).await?,
            TodoSelection::All => self.repository.get_all().await?,
        };
        tracing::Span::current().record("todo.count", todos.len());
        Ok(Outcome::Success(todos.iter().map(TodoDto::from).collect()))
    }
}
