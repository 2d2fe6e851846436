use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Todo;

/// Wire representation of a [`Todo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Todo> for TodoDto {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id(),
            title: todo.title().to_string(),
            description: todo.description().map(str::to_string),
            is_completed: todo.is_completed(),
            due_date: todo.due_date(),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
        }
    }
}

/// A missing `title` deserializes to "" so it is reported by validation,
/// not rejected by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoDto {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoDto {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// `None` means "not supplied", distinct from `Some(false)`.
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// List query parameters. Only one dimension is honored, see [`TodoSelection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFilter {
    pub is_completed: Option<bool>,
    pub due_before: Option<DateTime<Utc>>,
    pub is_overdue: Option<bool>,
    pub search_term: Option<String>,
}

/// The single repository read a list request resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum TodoSelection {
    Completed,
    Incomplete,
    DueBefore(DateTime<Utc>),
    Overdue,
    Search(String),
    All,
}

impl TodoSelection {
    /// First match wins: completion flag, due-before, overdue, search term, all.
    pub fn from_filter(filter: Option<&TodoFilter>) -> Self {
        let Some(filter) = filter else {
            return TodoSelection::All;
        };
        if let Some(completed) = filter.is_completed {
            return if completed {
                TodoSelection::Completed
            } else {
                TodoSelection::Incomplete
            };
        }
        if let Some(due_before) = filter.due_before {
            return TodoSelection::DueBefore(due_before);
        }
        if filter.is_overdue == Some(true) {
            return TodoSelection::Overdue;
        }
        match filter.search_term.as_deref() {
            Some(term) if !term.trim().is_empty() => TodoSelection::Search(term.to_string()),
            _ => TodoSelection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_precedence() {
        let due = Utc::now();
        let everything = TodoFilter {
            is_completed: Some(true),
            due_before: Some(due),
            is_overdue: Some(true),
            search_term: Some("milk".into()),
        };
        assert_eq!(TodoSelection::from_filter(Some(&everything)), TodoSelection::Completed);

        let no_flag = TodoFilter { is_completed: None, ..everything.clone() };
        assert_eq!(TodoSelection::from_filter(Some(&no_flag)), TodoSelection::DueBefore(due));

        let overdue_and_search = TodoFilter { due_before: None, ..no_flag.clone() };
        assert_eq!(TodoSelection::from_filter(Some(&overdue_and_search)), TodoSelection::Overdue);

        let not_overdue = TodoFilter { is_overdue: Some(false), ..overdue_and_search };
        assert_eq!(
            TodoSelection::from_filter(Some(&not_overdue)),
            TodoSelection::Search("milk".into())
        );
    }

    #[test]
    fn explicit_false_completion_flag_selects_incomplete() {
        let filter = TodoFilter { is_completed: Some(false), ..Default::default() };
        assert_eq!(TodoSelection::from_filter(Some(&filter)), TodoSelection::Incomplete);
    }

    #[test]
    fn blank_search_and_empty_filter_select_all() {
        let blank = TodoFilter { search_term: Some("   ".into()), ..Default::default() };
        assert_eq!(TodoSelection::from_filter(Some(&blank)), TodoSelection::All);
        assert_eq!(TodoSelection::from_filter(Some(&TodoFilter::default())), TodoSelection::All);
        assert_eq!(TodoSelection::from_filter(None), TodoSelection::All);
    }

    #[test]
    fn dto_uses_camel_case_on_the_wire() {
        let todo = Todo::new("Buy milk", None, None).unwrap();
        let json = serde_json::to_value(TodoDto::from(&todo)).unwrap();
        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["isCompleted"], false);
        assert!(json["dueDate"].is_null());
        assert!(json["description"].is_null());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn update_dto_distinguishes_absent_completion_flag() {
        let absent: UpdateTodoDto = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.is_completed, None);
        let explicit: UpdateTodoDto = serde_json::from_str(r#"{"title":"x","isCompleted":false}"#).unwrap();
        assert_eq!(explicit.is_completed, Some(false));
    }
}
