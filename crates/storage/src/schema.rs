//! Versioned schema of the entity store.
//!
//! The version is kept in SQLite's `user_version` header field. Every
//! migration step runs in its own transaction together with the version
//! bump. A stored version that cannot be reached by the registered steps is
//! an error unless the destructive fallback is enabled.

use log::{info, warn};
use rusqlite::Connection;

use crate::SQLiteError;

pub const CURRENT_VERSION: u32 = 3;

#[derive(Debug)]
pub struct Migration {
    pub from: u32,
    pub to: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        from: 0,
        to: 1,
        description: "users, exercises and completed activities",
        sql: r"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                display_name TEXT NOT NULL,
                registered_at INTEGER NOT NULL
            );

            CREATE TABLE exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                calories INTEGER NOT NULL,
                image_ref TEXT
            );

            CREATE INDEX idx_exercises_category ON exercises(category);

            CREATE TABLE completed_activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                exercise_name TEXT NOT NULL,
                completed_at INTEGER NOT NULL,  -- epoch ms
                duration_minutes INTEGER NOT NULL,
                calories_burned INTEGER NOT NULL,
                notes TEXT
            );

            CREATE INDEX idx_completed_activities_user
                ON completed_activities(user_id, completed_at);
        ",
    },
    Migration {
        from: 1,
        to: 2,
        description: "routines and routine exercises",
        sql: r"
            CREATE TABLE routines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL
            );

            CREATE TABLE routine_exercises (
                routine_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                PRIMARY KEY (routine_id, exercise_id)
            );

            CREATE INDEX idx_routine_exercises_exercise ON routine_exercises(exercise_id);
        ",
    },
    Migration {
        from: 2,
        to: 3,
        description: "workout parameters of routine exercises",
        sql: r"
            ALTER TABLE routine_exercises ADD COLUMN sets INTEGER;
            ALTER TABLE routine_exercises ADD COLUMN reps INTEGER;
            ALTER TABLE routine_exercises ADD COLUMN weight REAL;
            ALTER TABLE routine_exercises ADD COLUMN duration_seconds INTEGER;
        ",
    },
];

/// Tables dropped by the destructive fallback, dependents first.
pub const TABLES: &[&str] = &[
    "completed_activities",
    "routine_exercises",
    "routines",
    "exercises",
    "users",
];

pub fn version(connection: &Connection) -> Result<u32, SQLiteError> {
    Ok(connection.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the schema to [`CURRENT_VERSION`] and return the version found.
pub fn migrate(connection: &mut Connection, destructive_fallback: bool) -> Result<u32, SQLiteError> {
    let found = version(connection)?;

    if found == CURRENT_VERSION {
        return Ok(found);
    }

    let steps = match plan(found) {
        Some(steps) => steps,
        None if destructive_fallback => {
            warn!(
                "no migration path from schema version {found} to {CURRENT_VERSION}, \
                 dropping all data"
            );
            reset(connection)?;
            plan(0).ok_or(SQLiteError::IncompatibleSchema {
                found: 0,
                expected: CURRENT_VERSION,
            })?
        }
        None => {
            return Err(SQLiteError::IncompatibleSchema {
                found,
                expected: CURRENT_VERSION,
            });
        }
    };

    for step in steps {
        apply(connection, step)?;
    }

    Ok(found)
}

/// The chain of steps leading from `from` to [`CURRENT_VERSION`].
fn plan(from: u32) -> Option<Vec<&'static Migration>> {
    let mut version = from;
    let mut steps = vec![];

    while version < CURRENT_VERSION {
        let step = MIGRATIONS.iter().find(|m| m.from == version)?;
        steps.push(step);
        version = step.to;
    }

    (version == CURRENT_VERSION).then_some(steps)
}

fn apply(connection: &mut Connection, step: &Migration) -> Result<(), SQLiteError> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(step.sql)?;
    transaction.pragma_update(None, "user_version", step.to)?;
    transaction.commit()?;
    info!(
        "migrated database from version {} to {} ({})",
        step.from, step.to, step.description
    );
    Ok(())
}

fn reset(connection: &mut Connection) -> Result<(), SQLiteError> {
    let transaction = connection.transaction()?;
    for table in TABLES {
        transaction.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    transaction.pragma_update(None, "user_version", 0)?;
    transaction.commit()?;
    Ok(())
}
