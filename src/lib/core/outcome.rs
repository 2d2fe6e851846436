/// Return contract for operations that can fail in an expected way.
///
/// A `Success` never carries errors and a `Failure` never carries a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Vec<String>),
}

impl<T> Outcome<T> {
    pub fn failure(error: impl Into<String>) -> Self {
        Outcome::Failure(vec![error.into()])
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Success(_) => &[],
            Outcome::Failure(errors) => errors,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(errors) => Outcome::Failure(errors),
        }
    }

    pub fn into_result(self) -> Result<T, Vec<String>> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(errors) => Err(errors),
        }
    }
}

pub fn not_found(id: uuid::Uuid) -> String {
    format!("Todo with ID {id} was not found")
}
