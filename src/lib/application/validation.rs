//! Field rules checked before a command reaches its handler.
//!
//! Errors are keyed by the camelCase wire name of the offending field.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::application::dto::{CreateTodoDto, UpdateTodoDto};
use crate::core::MAX_TITLE_LENGTH;
use crate::telemetry::events;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_TOO_LONG: &str = "Title must not exceed 255 characters";
pub const DUE_DATE_IN_PAST: &str = "Due date must be in the future";
pub const COMPLETION_REQUIRED: &str = "IsCompleted status must be specified";

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn check_title(title: &str, errors: &mut ValidationErrors) {
    if title.trim().is_empty() {
        errors.add("title", rule("required", TITLE_REQUIRED));
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.add("title", rule("length", TITLE_TOO_LONG));
    }
}

/// Absent is always fine; present must be strictly after `now`.
fn check_due_date(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>, errors: &mut ValidationErrors) {
    if let Some(due) = due_date {
        if due <= now {
            errors.add("dueDate", rule("future", DUE_DATE_IN_PAST));
        }
    }
}

fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl Validate for CreateTodoDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&self.title, &mut errors);
        check_due_date(self.due_date, Utc::now(), &mut errors);
        finish(errors)
    }
}

impl Validate for UpdateTodoDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&self.title, &mut errors);
        check_due_date(self.due_date, Utc::now(), &mut errors);
        if self.is_completed.is_none() {
            errors.add("isCompleted", rule("required", COMPLETION_REQUIRED));
        }
        finish(errors)
    }
}

/// Runs `input`'s rules, logging a ValidationFailed event on rejection.
pub fn gate<V: Validate>(operation: &'static str, input: &V) -> Result<(), ValidationErrors> {
    input.validate().inspect_err(|errors| {
        tracing::warn!(
            event_id = events::VALIDATION_FAILED.id,
            event = events::VALIDATION_FAILED.name,
            operation,
            errors = ?field_messages(errors),
            "Validation failed"
        );
    })
}

/// Flattens validator output into `field -> [message]`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, failures)| {
            let messages = failures
                .iter()
                .map(|failure| {
                    failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create(title: &str, due_date: Option<DateTime<Utc>>) -> CreateTodoDto {
        CreateTodoDto {
            title: title.to_string(),
            description: None,
            due_date,
        }
    }

    fn messages(dto: &impl Validate) -> BTreeMap<String, Vec<String>> {
        field_messages(&dto.validate().unwrap_err())
    }

    #[test]
    fn valid_create_passes() {
        assert!(create("Buy milk", None).validate().is_ok());
        assert!(create("Buy milk", Some(Utc::now() + Duration::days(1))).validate().is_ok());
        assert!(create(&"x".repeat(255), None).validate().is_ok());
    }

    #[test]
    fn blank_title_is_required() {
        for title in ["", "   ", "\t"] {
            assert_eq!(messages(&create(title, None))["title"], vec![TITLE_REQUIRED]);
        }
    }

    #[test]
    fn title_longer_than_255_is_rejected() {
        assert_eq!(messages(&create(&"x".repeat(256), None))["title"], vec![TITLE_TOO_LONG]);
    }

    #[test]
    fn due_date_must_be_strictly_in_the_future() {
        let past = create("Task", Some(Utc::now() - Duration::minutes(1)));
        assert_eq!(messages(&past)["dueDate"], vec![DUE_DATE_IN_PAST]);

        let now = Utc::now();
        let mut errors = ValidationErrors::new();
        check_due_date(Some(now), now, &mut errors);
        assert!(!errors.is_empty());
    }

    #[test]
    fn update_requires_completion_flag() {
        let dto = UpdateTodoDto {
            title: "Task".into(),
            ..Default::default()
        };
        assert_eq!(messages(&dto)["isCompleted"], vec![COMPLETION_REQUIRED]);

        let ok = UpdateTodoDto {
            title: "Task".into(),
            is_completed: Some(false),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn errors_are_reported_per_field() {
        let dto = UpdateTodoDto {
            title: String::new(),
            due_date: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        };
        let map = messages(&dto);
        assert_eq!(map.len(), 3);
        assert!(map.contains_key("title"));
        assert!(map.contains_key("dueDate"));
        assert!(map.contains_key("isCompleted"));
    }
}
