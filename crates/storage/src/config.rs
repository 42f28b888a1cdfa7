use std::path::PathBuf;

pub const DATABASE_NAME: &str = "fitness_app_database.sqlite3";

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub location: Location,
    /// Drop and recreate all tables if the stored schema version cannot be
    /// migrated to the current one. When disabled, opening fails instead.
    pub destructive_fallback: bool,
    pub seed_catalog: bool,
    pub seed_routines: bool,
    /// Capacity of the change notification channel of live queries.
    pub change_buffer: usize,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    File(PathBuf),
    Memory,
}

impl StoreConfig {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: Location::File(PathBuf::from(DATABASE_NAME)),
            destructive_fallback: false,
            seed_catalog: true,
            seed_routines: true,
            change_buffer: 64,
        }
    }
}
