use std::fmt::Display;

/// Result of a user-triggered operation as presented to the user.
///
/// `Pending` is the state before the operation has finished (or before it
/// was started). Failures carry a message suitable for direct display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Error(String),
    Pending,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Error(message) => Some(message),
            Outcome::Success(_) | Outcome::Pending => None,
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Outcome::Pending
    }
}

impl<T, E: Display> From<Result<T, E>> for Outcome<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{Conflict, CreateError, LoginError};

    use super::*;

    #[test]
    fn test_outcome_from_ok() {
        let outcome = Outcome::from(Ok::<_, CreateError>(1));
        assert_eq!(outcome, Outcome::Success(1));
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn test_outcome_from_err() {
        let outcome = Outcome::<()>::from(Err(CreateError::Conflict(Conflict::RoutineExercise)));
        assert_eq!(
            outcome,
            Outcome::Error(String::from("exercise already in routine"))
        );
        assert_eq!(
            Outcome::<()>::from(Err(LoginError::InvalidCredentials)).message(),
            Some("invalid email or password")
        );
    }

    #[test]
    fn test_outcome_default_is_pending() {
        assert!(Outcome::<u8>::default().is_pending());
    }
}
