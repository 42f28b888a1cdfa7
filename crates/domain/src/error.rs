use crate::{EmailError, NameError, PasswordError};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxError),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    #[error("{0}")]
    Conflict(Conflict),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl From<ReadError> for CreateError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => CreateError::Other("unexpected missing record".into()),
            ReadError::Storage(storage) => CreateError::Storage(storage),
            ReadError::Other(other) => CreateError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DeleteError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxError),
}

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Deliberately does not reveal whether the email or the password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl From<ReadError> for LoginError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => LoginError::InvalidCredentials,
            ReadError::Storage(storage) => LoginError::Storage(storage),
            ReadError::Other(other) => LoginError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    #[error("email address is already registered")]
    Email,
    #[error("exercise already in routine")]
    RoutineExercise,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("email and password must not be empty")]
    MissingCredentials,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Other(#[from] BoxError),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_create_error_from_read_error() {
        assert!(matches!(
            CreateError::from(ReadError::Storage(StorageError::Unavailable("x".into()))),
            CreateError::Storage(StorageError::Unavailable(reason)) if reason == "x"
        ));
        assert!(matches!(
            CreateError::from(ReadError::Other("foo".into())),
            CreateError::Other(error) if error.to_string() == "foo"
        ));
    }

    #[test]
    fn test_login_error_from_read_error() {
        assert!(matches!(
            LoginError::from(ReadError::NotFound),
            LoginError::InvalidCredentials
        ));
        assert!(matches!(
            LoginError::from(ReadError::Other("foo".into())),
            LoginError::Other(error) if error.to_string() == "foo"
        ));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CreateError::Conflict(Conflict::Email).to_string(),
            "email address is already registered"
        );
        assert_eq!(
            CreateError::Conflict(Conflict::RoutineExercise).to_string(),
            "exercise already in routine"
        );
        assert_eq!(CreateError::NotFound("routine").to_string(), "routine not found");
        assert_eq!(
            CreateError::from(ValidationError::Name(NameError::Empty)).to_string(),
            "Name must not be empty"
        );
        assert_eq!(
            LoginError::from(ValidationError::MissingCredentials).to_string(),
            "email and password must not be empty"
        );
        assert_eq!(
            LoginError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
    }
}
