use std::sync::Arc;

use tracing::{field, info, instrument, warn};
use uuid::Uuid;

use crate::application::dto::{CreateTodoDto, TodoDto, UpdateTodoDto};
use crate::core::{AppError, Outcome, Todo, not_found};
use crate::storage::TodoRepository;
use crate::telemetry::{Telemetry, events};

#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub data: CreateTodoDto,
}

#[derive(Debug, Clone)]
pub struct UpdateTodo {
    pub id: Uuid,
    pub data: UpdateTodoDto,
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteTodo {
    pub id: Uuid,
}

pub struct CreateTodoHandler<R: ?Sized> {
    repository: Arc<R>,
    telemetry: Telemetry,
}

impl<R: TodoRepository + ?Sized> CreateTodoHandler<R> {
    pub fn new(repository: Arc<R>, telemetry: Telemetry) -> Self {
        Self { repository, telemetry }
    }

    #[instrument(
        name = "create_todo",
        skip_all,
        fields(todo.title = %command.data.title, todo.id = field::Empty)
    )]
    pub async fn handle(&self, command: CreateTodo) -> Result<Outcome<TodoDto>, AppError> {
        let CreateTodoDto { title, description, due_date } = command.data;
        let todo = Todo::new(title, description, due_date)?;
        let created = self.repository.add(todo).await?;

        tracing::Span::current().record("todo.id", field::display(created.id()));
        self.telemetry.todo_created();
        info!(
            event_id = events::TODO_CREATED.id,
            event = events::TODO_CREATED.name,
            todo_id = %created.id(),
            "Todo created"
        );
        Ok(Outcome::Success(TodoDto::from(&created)))
    }
}

pub struct UpdateTodoHandler<R: ?Sized> {
    repository: Arc<R>,
    telemetry: Telemetry,
}

impl<R: TodoRepository + ?Sized> UpdateTodoHandler<R> {
    pub fn new(repository: Arc<R>, telemetry: Telemetry) -> Self {
        Self { repository, telemetry }
    }

    #[instrument(name = "update_todo", skip_all, fields(todo.id = %command.id))]
    pub async fn handle(&self, command: UpdateTodo) -> Result<Outcome<TodoDto>, AppError> {
        let Some(mut todo) = self.repository.get_by_id(command.id).await? else {
            warn!(
                event_id = events::TODO_NOT_FOUND.id,
                event = events::TODO_NOT_FOUND.name,
                todo_id = %command.id,
                "Todo not found"
            );
            return Ok(Outcome::failure(not_found(command.id)));
        };

        let was_completed = todo.is_completed();
        let UpdateTodoDto { title, description, due_date, is_completed } = command.data;
        todo.update(title, description, due_date)?;
        match is_completed {
            Some(true) => todo.mark_complete(),
            Some(false) => todo.mark_incomplete(),
            None => {}
        }
        self.repository.update(&todo).await?;

        if !was_completed && todo.is_completed() {
            self.telemetry.todo_completed();
            info!(
                event_id = events::TODO_COMPLETED.id,
                event = events::TODO_COMPLETED.name,
                todo_id = %todo.id(),
                "Todo completed"
            );
        }
        info!(
            event_id = events::TODO_UPDATED.id,
            event = events::TODO_UPDATED.name,
            todo_id = %todo.id(),
            "Todo updated"
        );
        Ok(Outcome::Success(TodoDto::from(&todo)))
    }
}

pub struct DeleteTodoHandler<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: TodoRepository + ?Sized> DeleteTodoHandler<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(name = "delete_todo", skip_all, fields(todo.id = %command.id))]
    pub async fn handle(&self, command: DeleteTodo) -> Result<Outcome<()>, AppError> {
        let Some(todo) = self.repository.get_by_id(command.id).await? else {
            warn!(
                event_id = events::TODO_NOT_FOUND.id,
                event = events::TODO_NOT_FOUND.name,
                todo_id = %command.id,
                "Todo not found"
            );
            return Ok(Outcome::failure(not_found(command.id)));
        };

        self.repository.delete(&todo).await?;
        info!(
            event_id = events::TODO_DELETED.id,
            event = events::TODO_DELETED.name,
            todo_id = %command.id,
            "Todo deleted"
        );
        Ok(Outcome::Success(()))
    }
}
