use std::any::Any;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{MatchedPath, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::net;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::application::{CreateTodoDto, TodoDto, TodoFilter, TodoService, UpdateTodoDto, validation};
use crate::config::AppConfig;
use crate::core::{AppError, Outcome};
use crate::storage::TodoRepository;
use crate::telemetry::{Telemetry, events, panic_message};

pub const TODO_ROUTE: &str = "/api/todo";

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TodoService<dyn TodoRepository>>,
    pub telemetry: Telemetry,
}

impl AppState {
    pub fn new(repository: Arc<dyn TodoRepository>, telemetry: Telemetry) -> Self {
        Self {
            service: Arc::new(TodoService::new(repository, telemetry.clone())),
            telemetry,
        }
    }
}

/// Error body shared by every failing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ProblemDetails {
    fn new(status: StatusCode, title: &str, detail: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            status: status.as_u16(),
            detail,
            errors: None,
        }
    }

    fn unexpected() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred",
            Some("Please try again later".to_string()),
        )
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(
            event_id = events::TODO_OPERATION_FAILED.id,
            event = events::TODO_OPERATION_FAILED.name,
            kind = self.kind(),
            error = %self,
            "An error occurred"
        );
        match self {
            AppError::Domain(err) => ProblemDetails::new(
                StatusCode::BAD_REQUEST,
                "Domain validation error",
                Some(err.to_string()),
            )
            .into_response(),
            AppError::Validation(errors) => ProblemDetails {
                errors: Some(validation::field_messages(&errors)),
                ..ProblemDetails::new(
                    StatusCode::BAD_REQUEST,
                    "One or more validation errors occurred.",
                    None,
                )
            }
            .into_response(),
            AppError::Storage(err) => {
                error!(
                    event_id = events::DATABASE_OPERATION_FAILED.id,
                    event = events::DATABASE_OPERATION_FAILED.name,
                    error = ?err,
                    "Database operation failed"
                );
                ProblemDetails::unexpected().into_response()
            }
        }
    }
}

fn failure(status: StatusCode, errors: Vec<String>) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    ProblemDetails::new(status, title, Some(errors.join("; "))).into_response()
}

async fn create_todo(
    State(state): State<AppState>,
    Json(body): Json<CreateTodoDto>,
) -> Result<Response, AppError> {
    Ok(match state.service.create_todo(body).await? {
        Outcome::Success(todo) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("{TODO_ROUTE}/{}", todo.id))],
            Json(todo),
        )
            .into_response(),
        Outcome::Failure(errors) => failure(StatusCode::BAD_REQUEST, errors),
    })
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTodoDto>,
) -> Result<Response, AppError> {
    Ok(match state.service.update_todo(id, body).await? {
        Outcome::Success(todo) => Json(todo).into_response(),
        Outcome::Failure(errors) => failure(StatusCode::NOT_FOUND, errors),
    })
}

async fn delete_todo(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response, AppError> {
    Ok(match state.service.delete_todo(id).await? {
        Outcome::Success(()) => StatusCode::NO_CONTENT.into_response(),
        Outcome::Failure(errors) => failure(StatusCode::NOT_FOUND, errors),
    })
}

async fn get_todo(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response, AppError> {
    Ok(match state.service.get_todo(id).await? {
        Outcome::Success(todo) => Json(todo).into_response(),
        Outcome::Failure(errors) => failure(StatusCode::NOT_FOUND, errors),
    })
}

async fn list_todos(
    State(state): State<AppState>,
    Query(filter): Query<TodoFilter>,
) -> Result<Response, AppError> {
    Ok(list_response(state.service.list_todos(Some(filter)).await?))
}

fn list_response(outcome: Outcome<Vec<TodoDto>>) -> Response {
    match outcome {
        Outcome::Success(todos) => Json(todos).into_response(),
        Outcome::Failure(errors) => failure(StatusCode::BAD_REQUEST, errors),
    }
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.telemetry.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Records `http_request_duration_ms` labelled with the matched route template.
/// A panicking handler is recorded as a 500 before the unwind reaches the panic layer.
async fn track_http_metrics(
    State(telemetry): State<Telemetry>,
    matched: MatchedPath,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let started = Instant::now();
    let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;
    let status = match &outcome {
        Ok(response) => response.status(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    telemetry.record_http_request(&method, matched.as_str(), status.as_u16(), started.elapsed());
    outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    error!(
        event_id = events::TODO_OPERATION_FAILED.id,
        event = events::TODO_OPERATION_FAILED.name,
        panic = message,
        "Request handler panicked"
    );
    ProblemDetails::unexpected().into_response()
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let uri = request.uri().to_string();
        tracing::info_span!("http_request", method = ?request.method(), uri)
    });

    Router::new()
        .route(TODO_ROUTE, get(list_todos).post(create_todo))
        .route(
            &format!("{TODO_ROUTE}/{{id}}"),
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .route_layer(middleware::from_fn_with_state(
            state.telemetry.clone(),
            track_http_metrics,
        ))
        .layer(trace_layer)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: &AppConfig) -> anyhow::Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to listen on port {}", config.port))?;
        Ok(Self {
            router: router(state),
            listener,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            event_id = events::APPLICATION_STARTED.id,
            event = events::APPLICATION_STARTED.name,
            addr = %self.listener.local_addr()?,
            "HTTP server started"
        );
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_failure_is_not_reported_as_an_empty_list() {
        let response = list_response(Outcome::failure("listing unavailable"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = list_response(Outcome::Success(Vec::new()));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
