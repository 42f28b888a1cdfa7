use liftlog_domain::catalog::{self, CatalogRoutine};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::SQLiteError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Seeded {
    pub exercises: usize,
    pub routines: usize,
}

impl Seeded {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercises == 0 && self.routines == 0
    }
}

/// Insert the starter catalog into empty tables.
///
/// Tables which already contain rows are left untouched, so running this on
/// every start is safe.
pub fn seed(
    connection: &mut Connection,
    exercises: bool,
    routines: bool,
) -> Result<Seeded, SQLiteError> {
    let transaction = connection.transaction()?;
    let mut seeded = Seeded::default();

    if exercises && is_empty(&transaction, "exercises")? {
        for exercise in &catalog::STARTER_EXERCISES {
            transaction.execute(
                "INSERT INTO exercises (name, description, category, duration_minutes, calories)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    exercise.name,
                    exercise.description,
                    exercise.category,
                    exercise.duration_minutes,
                    exercise.calories,
                ],
            )?;
            seeded.exercises += 1;
        }
    }

    if routines && is_empty(&transaction, "routines")? {
        for routine in &catalog::STARTER_ROUTINES {
            insert_routine(&transaction, routine)?;
            seeded.routines += 1;
        }
    }

    transaction.commit()?;

    if !seeded.is_empty() {
        info!(
            "seeded {} exercises and {} routines",
            seeded.exercises, seeded.routines
        );
    }

    Ok(seeded)
}

fn is_empty(transaction: &Transaction, table: &str) -> Result<bool, SQLiteError> {
    let exists: bool = transaction.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table})"),
        [],
        |row| row.get(0),
    )?;
    Ok(!exists)
}

fn insert_routine(transaction: &Transaction, routine: &CatalogRoutine) -> Result<(), SQLiteError> {
    transaction.execute(
        "INSERT INTO routines (name, description) VALUES (?1, ?2)",
        params![routine.name, routine.description],
    )?;
    let routine_id = transaction.last_insert_rowid();

    for (name, parameters) in routine.exercises {
        let exercise_id: Option<i64> = transaction
            .query_row(
                "SELECT id FROM exercises WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        let Some(exercise_id) = exercise_id else {
            warn!("skipped {name} in starter routine {}: not in catalog", routine.name);
            continue;
        };

        transaction.execute(
            "INSERT OR REPLACE INTO routine_exercises
                 (routine_id, exercise_id, sets, reps, weight, duration_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                routine_id,
                exercise_id,
                parameters.sets,
                parameters.reps,
                parameters.weight,
                parameters.duration_seconds,
            ],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::schema;

    use super::*;

    fn connection() -> Connection {
        let mut connection = Connection::open_in_memory().unwrap();
        schema::migrate(&mut connection, false).unwrap();
        connection
    }

    fn count(connection: &Connection, table: &str) -> i64 {
        connection
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut connection = connection();

        assert_eq!(
            seed(&mut connection, true, true).unwrap(),
            Seeded {
                exercises: 9,
                routines: 1
            }
        );
        assert_eq!(seed(&mut connection, true, true).unwrap(), Seeded::default());

        assert_eq!(count(&connection, "exercises"), 9);
        assert_eq!(count(&connection, "routines"), 1);
        assert_eq!(count(&connection, "routine_exercises"), 3);
    }

    #[test]
    fn test_seed_assigns_catalog_order() {
        let mut connection = connection();
        seed(&mut connection, true, false).unwrap();

        let name: String = connection
            .query_row("SELECT name FROM exercises WHERE id = 5", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Squats");
        assert_eq!(count(&connection, "routines"), 0);
    }

    #[test]
    fn test_seed_starter_routine_parameters() {
        let mut connection = connection();
        seed(&mut connection, true, true).unwrap();

        let plank: (Option<i64>, Option<f64>, Option<i64>) = connection
            .query_row(
                "SELECT re.sets, re.weight, re.duration_seconds
                 FROM routine_exercises re JOIN exercises e ON e.id = re.exercise_id
                 WHERE e.name = 'Plank'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(plank, (None, None, Some(60)));
    }

    #[test]
    fn test_seed_routines_without_catalog() {
        let mut connection = connection();

        assert_eq!(
            seed(&mut connection, false, true).unwrap(),
            Seeded {
                exercises: 0,
                routines: 1
            }
        );
        assert_eq!(count(&connection, "routine_exercises"), 0);
    }
}
