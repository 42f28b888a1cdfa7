use liftlog_domain::Service;
use log::debug;
use tokio::sync::OnceCell;

use crate::{SQLite, SQLiteError, StoreConfig};

/// Owner of the store handle.
///
/// The database is opened on first access and shared by every service
/// created afterwards.
pub struct AppContext {
    config: StoreConfig,
    database: OnceCell<SQLite>,
}

impl AppContext {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            database: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn database(&self) -> Result<&SQLite, SQLiteError> {
        self.database
            .get_or_try_init(|| async {
                let config = self.config.clone();
                tokio::task::spawn_blocking(move || SQLite::open(&config)).await?
            })
            .await
    }

    pub async fn service(&self) -> Result<Service<SQLite>, SQLiteError> {
        Ok(Service::new(self.database().await?.clone()))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.database.initialized()
    }

    /// Release the store handle. The next access opens the database again.
    ///
    /// Services created before keep their own handle until dropped.
    pub fn reset(&mut self) {
        if self.database.take().is_some() {
            debug!("closed database");
        }
    }
}

#[cfg(test)]
mod tests {
    use liftlog_domain::{ExerciseService, UserService};
    use pretty_assertions::assert_eq;

    use crate::{DATABASE_NAME, tests::data};

    use super::*;

    #[tokio::test]
    async fn test_database_is_opened_lazily() {
        let context = AppContext::new(StoreConfig::in_memory());

        assert!(!context.is_open());

        let service = context.service().await.unwrap();

        assert!(context.is_open());
        assert_eq!(service.count_exercises().await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_services_share_database() {
        let context = AppContext::new(StoreConfig::in_memory());

        let user = context
            .service()
            .await
            .unwrap()
            .register(data::EMAIL, data::PASSWORD, data::DISPLAY_NAME)
            .await
            .unwrap();

        assert_eq!(
            context.service().await.unwrap().get_users().await.unwrap(),
            vec![user]
        );
    }

    #[tokio::test]
    async fn test_reset() {
        let mut context = AppContext::new(StoreConfig::in_memory());
        context
            .service()
            .await
            .unwrap()
            .register(data::EMAIL, data::PASSWORD, data::DISPLAY_NAME)
            .await
            .unwrap();

        context.reset();

        assert!(!context.is_open());
        assert_eq!(
            context.service().await.unwrap().get_users().await.unwrap(),
            vec![]
        );
    }

    #[tokio::test]
    async fn test_open_failure() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(DATABASE_NAME);
        rusqlite::Connection::open(&path)
            .unwrap()
            .pragma_update(None, "user_version", 42)
            .unwrap();
        let context = AppContext::new(StoreConfig::at(&path));

        assert!(matches!(
            context.database().await,
            Err(SQLiteError::IncompatibleSchema { found: 42, .. })
        ));
        assert!(!context.is_open());
        assert_eq!(context.config().location, crate::Location::File(path));
    }
}
