use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::core::error::TodoDomainError;

pub const MAX_TITLE_LENGTH: usize = 255;

/// Instants are kept at microsecond precision, the resolution storage keeps.
const INSTANT_DIGITS: u16 = 6;

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(INSTANT_DIGITS)
}

fn normalize(instant: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    instant.map(|i| i.trunc_subsecs(INSTANT_DIGITS))
}

/// A single task. Title invariants are enforced on construction and on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    id: Uuid,
    title: String,
    description: Option<String>,
    is_completed: bool,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, TodoDomainError> {
        Self::with_id(Uuid::new_v4(), title, description, due_date)
    }

    /// Same as [`Todo::new`] but with a caller-chosen identity, for fixtures.
    pub fn with_id(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, TodoDomainError> {
        let title = title.into();
        check_title(&title)?;
        let stamp = now();
        Ok(Self {
            id,
            title,
            description,
            is_completed: false,
            due_date: normalize(due_date),
            created_at: stamp,
            updated_at: stamp,
        })
    }

    /// Rehydrates a stored row. No validation: the row was valid when written.
    pub fn restore(
        id: Uuid,
        title: String,
        description: Option<String>,
        is_completed: bool,
        due_date: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            is_completed,
            due_date,
            created_at,
            updated_at,
        }
    }

    pub fn update(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<(), TodoDomainError> {
        let title = title.into();
        check_title(&title)?;
        self.title = title;
        self.description = description;
        self.due_date = normalize(due_date);
        self.updated_at = now();
        Ok(())
    }

    /// No-op (and no timestamp bump) when already complete.
    pub fn mark_complete(&mut self) {
        if self.is_completed {
            return;
        }
        self.is_completed = true;
        self.updated_at = now();
    }

    pub fn mark_incomplete(&mut self) {
        if !self.is_completed {
            return;
        }
        self.is_completed = false;
        self.updated_at = now();
    }

    /// Incomplete and due strictly before `now`.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn check_title(title: &str) -> Result<(), TodoDomainError> {
    if title.trim().is_empty() {
        return Err(TodoDomainError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TodoDomainError::TitleTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_todo_starts_incomplete_with_equal_timestamps() {
        let todo = Todo::new("Buy milk", None, None).unwrap();
        assert_eq!(todo.title(), "Buy milk");
        assert!(!todo.is_completed());
        assert_eq!(todo.created_at(), todo.updated_at());
        assert!(!todo.id().is_nil());
    }

    #[test]
    fn title_is_stored_verbatim() {
        let todo = Todo::new("  two  spaces  ", None, None).unwrap();
        assert_eq!(todo.title(), "  two  spaces  ");
    }

    #[test]
    fn blank_titles_are_rejected() {
        for title in ["", " ", "\t\n  "] {
            let err = Todo::new(title, None, None).unwrap_err();
            assert!(matches!(err, TodoDomainError::EmptyTitle));
        }
    }

    #[test]
    fn title_length_boundary() {
        assert!(Todo::new("a".repeat(255), None, None).is_ok());
        let err = Todo::new("a".repeat(256), None, None).unwrap_err();
        assert!(matches!(err, TodoDomainError::TitleTooLong));
    }

    #[test]
    fn update_revalidates_title_and_leaves_todo_untouched_on_failure() {
        let mut todo = Todo::new("Original", None, None).unwrap();
        let before = todo.clone();
        assert!(todo.update("   ", None, None).is_err());
        assert_eq!(todo, before);
    }

    #[test]
    fn update_replaces_fields_and_bumps_updated_at() {
        let mut todo = Todo::new("Original", Some("desc".into()), None).unwrap();
        let due = Utc::now() + Duration::days(2);
        std::thread::sleep(std::time::Duration::from_millis(2));
        todo.update("Changed", None, Some(due)).unwrap();
        assert_eq!(todo.title(), "Changed");
        assert_eq!(todo.description(), None);
        assert_eq!(todo.due_date(), Some(due.trunc_subsecs(6)));
        assert!(todo.updated_at() > todo.created_at());
    }

    #[test]
    fn completion_transitions_are_idempotent() {
        let mut todo = Todo::new("Task", None, None).unwrap();
        let untouched = todo.updated_at();
        todo.mark_incomplete();
        assert_eq!(todo.updated_at(), untouched);

        std::thread::sleep(std::time::Duration::from_millis(2));
        todo.mark_complete();
        assert!(todo.is_completed());
        let completed_at = todo.updated_at();
        assert!(completed_at > untouched);

        std::thread::sleep(std::time::Duration::from_millis(2));
        todo.mark_complete();
        assert_eq!(todo.updated_at(), completed_at);
    }

    #[test]
    fn instants_are_kept_at_microsecond_precision() {
        let due = Utc::now() + Duration::days(1);
        let mut todo = Todo::new("Precise", None, Some(due)).unwrap();
        assert_eq!(todo.created_at().timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(todo.due_date(), Some(due.trunc_subsecs(6)));

        todo.update("Precise", None, Some(due)).unwrap();
        todo.mark_complete();
        assert_eq!(todo.updated_at().timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(todo.due_date().unwrap().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn overdue_requires_incomplete_and_past_due() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut todo = Todo::with_id(id, "Late", None, Some(now - Duration::hours(1))).unwrap();
        assert_eq!(todo.id(), id);
        assert!(todo.is_overdue_at(now));
        todo.mark_complete();
        assert!(!todo.is_overdue_at(now));

        let undated = Todo::new("Whenever", None, None).unwrap();
        assert!(!undated.is_overdue_at(now));
    }
}
