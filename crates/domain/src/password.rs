use std::fmt;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A password as entered by the user.
///
/// Passwords are stored and compared as plaintext. Hashing is an open
/// decision and has not been introduced.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: &str) -> Result<Self, PasswordError> {
        let len = password.chars().count();

        if len < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(len));
        }

        Ok(Password(password.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must be at least 6 characters long ({0} < 6)")]
    TooShort(usize),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("secret", Ok("secret"))]
    #[case(" spaced ", Ok(" spaced "))]
    #[case("ñandú1", Ok("ñandú1"))]
    #[case("12345", Err(PasswordError::TooShort(5)))]
    #[case("", Err(PasswordError::TooShort(0)))]
    fn test_password_new(#[case] password: &str, #[case] expected: Result<&str, PasswordError>) {
        assert_eq!(
            Password::new(password).as_ref().map(Password::as_str),
            expected.as_ref().map(|p| *p)
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        assert_eq!(
            format!("{:?}", Password::new("hunter22").unwrap()),
            "Password(***)"
        );
    }
}
