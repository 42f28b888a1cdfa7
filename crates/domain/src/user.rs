use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};

use crate::{CreateError, DeleteError, Email, LoginError, Name, Password, ReadError};

#[allow(async_fn_in_trait)]
pub trait UserService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, CreateError>;
    async fn login(&self, email: &str, password: &str) -> Result<User, LoginError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ReadError>;
    async fn get_users(&self) -> Result<Vec<User>, ReadError>;
    async fn delete_user(&self, id: UserID) -> Result<UserID, DeleteError>;
}

/// Emails passed to the lookup methods are expected in normalized form.
#[allow(async_fn_in_trait)]
pub trait UserRepository {
    async fn read_users(&self) -> Result<Vec<User>, ReadError>;
    async fn read_user_by_email(&self, email: &str) -> Result<Option<User>, ReadError>;
    async fn read_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ReadError>;
    async fn create_user(&self, user: NewUser) -> Result<User, CreateError>;
    async fn delete_user(&self, id: UserID) -> Result<UserID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserID,
    pub email: Email,
    pub password: Password,
    pub display_name: Name,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Email,
    pub password: Password,
    pub display_name: Name,
    pub registered_at: DateTime<Utc>,
}

impl NewUser {
    #[must_use]
    pub fn with_id(self, id: UserID) -> User {
        User {
            id,
            email: self.email,
            password: self.password,
            display_name: self.display_name,
            registered_at: self.registered_at,
        }
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserID(i64);

impl From<i64> for UserID {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
