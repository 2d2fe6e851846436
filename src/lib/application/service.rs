use std::sync::Arc;

use uuid::Uuid;

use crate::application::commands::*;
use crate::application::dto::{CreateTodoDto, TodoDto, TodoFilter, UpdateTodoDto};
use crate::application::queries::*;
use crate::application::validation;
use crate::core::{AppError, Outcome};
use crate::storage::TodoRepository;
use crate::telemetry::Telemetry;

/// Entry point for every command and query. Each call runs as
/// telemetry wrapper -> validation gate -> handler.
pub struct TodoService<R: ?Sized> {
    create: CreateTodoHandler<R>,
    update: UpdateTodoHandler<R>,
    delete: DeleteTodoHandler<R>,
    get_by_id: GetTodoByIdHandler<R>,
    list: GetTodosHandler<R>,
    telemetry: Telemetry,
}

impl<R: TodoRepository + ?Sized> TodoService<R> {
    pub fn new(repository: Arc<R>, telemetry: Telemetry) -> Self {
        Self {
            create: CreateTodoHandler::new(repository.clone(), telemetry.clone()),
            update: UpdateTodoHandler::new(repository.clone(), telemetry.clone()),
            delete: DeleteTodoHandler::new(repository.clone()),
            get_by_id: GetTodoByIdHandler::new(repository.clone()),
            list: GetTodosHandler::new(repository),
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub async fn create_todo(&self, data: CreateTodoDto) -> Result<Outcome<TodoDto>, AppError> {
        self.telemetry
            .instrumented("CreateTodo", async {
                validation::gate("CreateTodo", &data)?;
                self.create.handle(CreateTodo { data }).await
            })
            .await
    }

    pub async fn update_todo(&self, id: Uuid, data: UpdateTodoDto) -> Result<Outcome<TodoDto>, AppError> {
        self.telemetry
            .instrumented("UpdateTodo", async {
                validation::gate("UpdateTodo", &data)?;
                self.update.handle(UpdateTodo { id, data }).await
            })
            .await
    }

    pub async fn delete_todo(&self, id: Uuid) -> Result<Outcome<()>, AppError> {
        self.telemetry
            .instrumented("DeleteTodo", self.delete.handle(DeleteTodo { id }))
            .await
    }

    pub async fn get_todo(&self, id: Uuid) -> Result<Outcome<TodoDto>, AppError> {
        self.telemetry
            .instrumented("GetTodoById", self.get_by_id.handle(GetTodoById { id }))
            .await
    }

    pub async fn list_todos(&self, filter: Option<TodoFilter>) -> Result<Outcome<Vec<TodoDto>>, AppError> {
        self.telemetry
            .instrumented("GetTodos", self.list.handle(GetTodos { filter }))
            .await
    }
}
