/// Stable identifiers attached to structured log lines as `event_id`/`event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent {
    pub id: u32,
    pub name: &'static str,
}

const fn event(id: u32, name: &'static str) -> LogEvent {
    LogEvent { id, name }
}

// CRUD
pub const TODO_CREATED: LogEvent = event(1000, "TodoCreated");
pub const TODO_COMPLETED: LogEvent = event(1001, "TodoCompleted");
pub const TODO_DELETED: LogEvent = event(1002, "TodoDeleted");
pub const TODO_UPDATED: LogEvent = event(1003, "TodoUpdated");

// Failures
pub const TODO_OPERATION_FAILED: LogEvent = event(2000, "TodoOperationFailed");
pub const TODO_NOT_FOUND: LogEvent = event(2001, "TodoNotFound");
pub const VALIDATION_FAILED: LogEvent = event(2002, "ValidationFailed");

// Database
pub const DATABASE_OPERATION_FAILED: LogEvent = event(3000, "DatabaseOperationFailed");

// System
pub const APPLICATION_STARTED: LogEvent = event(9000, "ApplicationStarted");
pub const DATABASE_MIGRATED: LogEvent = event(9001, "DatabaseMigrated");
