use std::sync::LazyLock;

use derive_more::{AsRef, Display};
use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9-]{0,25})+$",
    )
    .expect("valid email pattern")
});

/// A normalized (trimmed, lowercase) and well-formed email address.
#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(email: &str) -> Result<Self, EmailError> {
        let normalized = normalize_email(email);

        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }

        if !EMAIL_PATTERN.is_match(&normalized) {
            return Err(EmailError::Malformed(normalized));
        }

        Ok(Email(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Emails are compared and stored in this form.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email address must not be empty")]
    Empty,
    #[error("Invalid email address: {0}")]
    Malformed(String),
}
