use std::{
    collections::HashMap,
    fmt::Display,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, SubsecRound, Utc};
use liftlog_domain as domain;
use log::{debug, error, info};
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use tokio::sync::watch;

use crate::{
    config::{Location, StoreConfig},
    live::{Changes, Dependencies, Table},
    schema,
    seed::{self, Seeded},
};

/// Entity store backed by a single SQLite connection.
///
/// Every operation runs on the blocking thread pool. Cloning the handle
/// shares the connection and the change notifications of live queries.
#[derive(Clone)]
pub struct SQLite {
    connection: Arc<Mutex<Connection>>,
    changes: Changes,
}

#[derive(thiserror::Error, Debug)]
pub enum SQLiteError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("incompatible schema version {found} (expected {expected})")]
    IncompatibleSchema { found: u32, expected: u32 },
    #[error("invalid {entity} row: {reason}")]
    InvalidRow { entity: &'static str, reason: String },
    #[error("{0}")]
    Conflict(domain::Conflict),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

impl SQLiteError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            SQLiteError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

impl From<SQLiteError> for domain::StorageError {
    fn from(value: SQLiteError) -> Self {
        match value {
            SQLiteError::Poisoned => domain::StorageError::Unavailable(value.to_string()),
            _ => domain::StorageError::Other(Box::new(value)),
        }
    }
}

impl From<SQLiteError> for domain::ReadError {
    fn from(value: SQLiteError) -> Self {
        match value {
            SQLiteError::NotFound(_) => domain::ReadError::NotFound,
            _ => domain::ReadError::Storage(value.into()),
        }
    }
}

impl From<SQLiteError> for domain::CreateError {
    fn from(value: SQLiteError) -> Self {
        match value {
            SQLiteError::Conflict(conflict) => domain::CreateError::Conflict(conflict),
            SQLiteError::NotFound(entity) => domain::CreateError::NotFound(entity),
            _ => domain::CreateError::Storage(value.into()),
        }
    }
}

impl From<SQLiteError> for domain::DeleteError {
    fn from(value: SQLiteError) -> Self {
        domain::DeleteError::Storage(value.into())
    }
}

impl SQLite {
    /// Open the database, migrate it to the current schema and seed the
    /// starter catalog as configured.
    ///
    /// Blocks the calling thread.
    pub fn open(config: &StoreConfig) -> Result<Self, SQLiteError> {
        let mut connection = match &config.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            Location::Memory => Connection::open_in_memory()?,
        };

        let found = schema::migrate(&mut connection, config.destructive_fallback)?;
        seed::seed(&mut connection, config.seed_catalog, config.seed_routines)?;

        info!(
            "opened database {:?} (schema version {found}, now {})",
            config.location,
            schema::CURRENT_VERSION
        );

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            changes: Changes::new(config.change_buffer),
        })
    }

    pub async fn seed(&self, exercises: bool, routines: bool) -> Result<Seeded, SQLiteError> {
        self.write(
            &[Table::Exercises, Table::Routines, Table::RoutineExercises],
            move |connection| seed::seed(connection, exercises, routines),
        )
        .await
    }

    pub async fn schema_version(&self) -> Result<u32, SQLiteError> {
        self.run(|connection| schema::version(connection)).await
    }

    /// Number of live queries currently running.
    #[must_use]
    pub fn live_queries(&self) -> usize {
        self.changes.listeners()
    }

    async fn run<T, F>(&self, f: F) -> Result<T, SQLiteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SQLiteError> + Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = connection.lock().map_err(|_| SQLiteError::Poisoned)?;
            f(&mut connection)
        })
        .await?
    }

    /// Run a write and notify the live queries depending on `tables` once it
    /// succeeded.
    async fn write<T, F>(&self, tables: &'static [Table], f: F) -> Result<T, SQLiteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SQLiteError> + Send + 'static,
    {
        let result = self.run(f).await?;
        debug!(
            "changed {}",
            tables
                .iter()
                .map(|table| table.as_ref())
                .collect::<Vec<&str>>()
                .join(", ")
        );
        self.changes.publish(tables);
        Ok(result)
    }

    /// Start a live query.
    ///
    /// The query is evaluated once up front and again after every write to
    /// one of its dependencies, until the subscription is dropped.
    async fn watch<T, Q>(
        &self,
        dependencies: Dependencies,
        query: Q,
    ) -> Result<domain::Subscription<T>, SQLiteError>
    where
        T: Clone + Send + Sync + 'static,
        Q: Fn(&Connection) -> Result<T, SQLiteError> + Send + Sync + 'static,
    {
        let query = Arc::new(query);
        // Subscribe before the initial query to not miss a concurrent write.
        let mut listener = self.changes.subscribe(dependencies);
        let initial = {
            let query = query.clone();
            self.run(move |connection| query(connection)).await?
        };
        let (sender, receiver) = watch::channel(initial);
        let database = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = sender.closed() => break,
                    affected = listener.affected() => {
                        if !affected {
                            break;
                        }
                        let query = query.clone();
                        match database.run(move |connection| query(connection)).await {
                            Ok(value) => {
                                if sender.send(value).is_err() {
                                    break;
                                }
                            }
                            Err(err) => error!("failed to refresh live query: {err}"),
                        }
                    }
                }
            }
            debug!("stopped live query");
        });

        Ok(domain::Subscription::new(receiver))
    }
}

trait FromRow: Sized {
    /// Number of columns read.
    const WIDTH: usize;

    /// Read the columns starting at `offset`.
    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self>;
}

impl<A: FromRow, B: FromRow> FromRow for (A, B) {
    const WIDTH: usize = A::WIDTH + B::WIDTH;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok((A::from_row(row, offset)?, B::from_row(row, offset + A::WIDTH)?))
    }
}

fn query_all<R: FromRow, P: Params>(
    connection: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<R>, SQLiteError> {
    let mut statement = connection.prepare_cached(sql)?;
    let rows = statement
        .query_map(params, |row| R::from_row(row, 0))?
        .collect::<Result<Vec<R>, _>>()?;
    Ok(rows)
}

fn query_optional<R: FromRow, P: Params>(
    connection: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<R>, SQLiteError> {
    Ok(connection
        .query_row(sql, params, |row| R::from_row(row, 0))
        .optional()?)
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, SQLiteError>
where
    T: TryFrom<R, Error = SQLiteError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn exists(connection: &Connection, table: &str, id: i64) -> Result<bool, SQLiteError> {
    Ok(connection.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )?)
}

fn count(connection: &Connection, table: &'static str) -> Result<u32, SQLiteError> {
    let count: i64 =
        connection.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    u32::try_from(count).map_err(|err| invalid(table, err))
}

fn invalid(entity: &'static str, reason: impl Display) -> SQLiteError {
    SQLiteError::InvalidRow {
        entity,
        reason: reason.to_string(),
    }
}

fn timestamp(entity: &'static str, millis: i64) -> Result<DateTime<Utc>, SQLiteError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| invalid(entity, format!("timestamp {millis} out of range")))
}

/// Map a unique constraint violation to a conflict.
fn unique<T>(result: rusqlite::Result<T>, conflict: domain::Conflict) -> Result<T, SQLiteError> {
    result.map_err(SQLiteError::from).map_err(|err| {
        if err.is_unique_violation() {
            SQLiteError::Conflict(conflict)
        } else {
            err
        }
    })
}

struct UserRow {
    id: i64,
    email: String,
    password: String,
    display_name: String,
    registered_at: i64,
}

const USER_COLUMNS: &str = "id, email, password, display_name, registered_at";

impl FromRow for UserRow {
    const WIDTH: usize = 5;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            email: row.get(offset + 1)?,
            password: row.get(offset + 2)?,
            display_name: row.get(offset + 3)?,
            registered_at: row.get(offset + 4)?,
        })
    }
}

impl TryFrom<UserRow> for domain::User {
    type Error = SQLiteError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(domain::User {
            id: row.id.into(),
            email: domain::Email::new(&row.email).map_err(|err| invalid("user", err))?,
            password: domain::Password::new(&row.password).map_err(|err| invalid("user", err))?,
            display_name: domain::Name::new(&row.display_name)
                .map_err(|err| invalid("user", err))?,
            registered_at: timestamp("user", row.registered_at)?,
        })
    }
}

struct ExerciseRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    duration_minutes: u32,
    calories: u32,
    image_ref: Option<String>,
}

impl FromRow for ExerciseRow {
    const WIDTH: usize = 7;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
            category: row.get(offset + 3)?,
            duration_minutes: row.get(offset + 4)?,
            calories: row.get(offset + 5)?,
            image_ref: row.get(offset + 6)?,
        })
    }
}

impl TryFrom<ExerciseRow> for domain::Exercise {
    type Error = SQLiteError;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        Ok(domain::Exercise {
            id: row.id.into(),
            name: domain::Name::new(&row.name).map_err(|err| invalid("exercise", err))?,
            description: row.description,
            category: domain::Category::from(row.category.as_str()),
            duration_minutes: row.duration_minutes,
            calories: row.calories,
            image_ref: row.image_ref,
        })
    }
}

struct RoutineRow {
    id: i64,
    name: String,
    description: String,
}

impl FromRow for RoutineRow {
    const WIDTH: usize = 3;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
        })
    }
}

impl TryFrom<RoutineRow> for domain::Routine {
    type Error = SQLiteError;

    fn try_from(row: RoutineRow) -> Result<Self, Self::Error> {
        Ok(domain::Routine {
            id: row.id.into(),
            name: domain::Name::new(&row.name).map_err(|err| invalid("routine", err))?,
            description: row.description,
        })
    }
}

struct LinkRow {
    routine_id: i64,
    exercise_id: i64,
    sets: Option<u32>,
    reps: Option<u32>,
    weight: Option<f64>,
    duration_seconds: Option<u32>,
}

impl FromRow for LinkRow {
    const WIDTH: usize = 6;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            routine_id: row.get(offset)?,
            exercise_id: row.get(offset + 1)?,
            sets: row.get(offset + 2)?,
            reps: row.get(offset + 3)?,
            weight: row.get(offset + 4)?,
            duration_seconds: row.get(offset + 5)?,
        })
    }
}

impl From<LinkRow> for domain::RoutineExercise {
    fn from(row: LinkRow) -> Self {
        domain::RoutineExercise {
            routine_id: row.routine_id.into(),
            exercise_id: row.exercise_id.into(),
            parameters: domain::WorkoutParameters {
                sets: row.sets,
                reps: row.reps,
                weight: row.weight,
                duration_seconds: row.duration_seconds,
            },
        }
    }
}

struct ActivityRow {
    id: i64,
    user_id: i64,
    exercise_id: i64,
    exercise_name: String,
    completed_at: i64,
    duration_minutes: u32,
    calories_burned: u32,
    notes: Option<String>,
}

impl FromRow for ActivityRow {
    const WIDTH: usize = 8;

    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            exercise_id: row.get(offset + 2)?,
            exercise_name: row.get(offset + 3)?,
            completed_at: row.get(offset + 4)?,
            duration_minutes: row.get(offset + 5)?,
            calories_burned: row.get(offset + 6)?,
            notes: row.get(offset + 7)?,
        })
    }
}

impl TryFrom<ActivityRow> for domain::CompletedActivity {
    type Error = SQLiteError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(domain::CompletedActivity {
            id: row.id.into(),
            user_id: row.user_id.into(),
            exercise_id: row.exercise_id.into(),
            exercise_name: row.exercise_name,
            completed_at: timestamp("activity", row.completed_at)?,
            duration_minutes: row.duration_minutes,
            calories_burned: row.calories_burned,
            notes: row.notes,
        })
    }
}

const INSERT_LINK: &str = "INSERT INTO routine_exercises
         (routine_id, exercise_id, sets, reps, weight, duration_seconds)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const UPSERT_LINK: &str = "INSERT OR REPLACE INTO routine_exercises
         (routine_id, exercise_id, sets, reps, weight, duration_seconds)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

fn write_link(
    connection: &Connection,
    sql: &str,
    link: &domain::RoutineExercise,
) -> rusqlite::Result<usize> {
    let parameters = &link.parameters;
    connection.execute(
        sql,
        params![
            *link.routine_id,
            *link.exercise_id,
            parameters.sets,
            parameters.reps,
            parameters.weight,
            parameters.duration_seconds,
        ],
    )
}

fn read_exercises(
    connection: &Connection,
    category: Option<&str>,
) -> Result<Vec<domain::Exercise>, SQLiteError> {
    convert_all(query_all::<ExerciseRow, _>(
        connection,
        "SELECT id, name, description, category, duration_minutes, calories, image_ref
         FROM exercises
         WHERE (?1 IS NULL OR category = ?1)
         ORDER BY name, id",
        [category],
    )?)
}

/// Routines joined with their exercises, optionally restricted to one routine.
fn read_routines(
    connection: &Connection,
    id: Option<i64>,
) -> Result<Vec<domain::RoutineWithExercises>, SQLiteError> {
    let mut routines = convert_all::<_, domain::Routine>(query_all::<RoutineRow, _>(
        connection,
        "SELECT id, name, description FROM routines WHERE (?1 IS NULL OR id = ?1) ORDER BY id",
        [id],
    )?)?
    .into_iter()
    .map(|routine| domain::RoutineWithExercises {
        routine,
        exercises: vec![],
        links: vec![],
    })
    .collect::<Vec<_>>();

    let positions = routines
        .iter()
        .enumerate()
        .map(|(i, r)| (r.routine.id, i))
        .collect::<HashMap<_, _>>();

    let rows = query_all::<(LinkRow, ExerciseRow), _>(
        connection,
        "SELECT re.routine_id, re.exercise_id, re.sets, re.reps, re.weight, re.duration_seconds,
                e.id, e.name, e.description, e.category, e.duration_minutes, e.calories,
                e.image_ref
         FROM routine_exercises re
         JOIN exercises e ON e.id = re.exercise_id
         WHERE (?1 IS NULL OR re.routine_id = ?1)
         ORDER BY re.routine_id, e.name, e.id",
        [id],
    )?;

    for (link, exercise) in rows {
        let link = domain::RoutineExercise::from(link);
        let Some(&position) = positions.get(&link.routine_id) else {
            continue;
        };
        let routine = &mut routines[position];
        routine.exercises.push(domain::Exercise::try_from(exercise)?);
        routine.links.push(link);
    }

    Ok(routines)
}

fn read_activities(
    connection: &Connection,
    user_id: i64,
    limit: Option<u32>,
) -> Result<Vec<domain::CompletedActivity>, SQLiteError> {
    convert_all(query_all::<ActivityRow, _>(
        connection,
        "SELECT id, user_id, exercise_id, exercise_name, completed_at, duration_minutes,
                calories_burned, notes
         FROM completed_activities
         WHERE user_id = ?1
         ORDER BY completed_at DESC, id DESC
         LIMIT ?2",
        params![user_id, limit.map_or(-1, i64::from)],
    )?)
}

impl domain::UserRepository for SQLite {
    async fn read_users(&self) -> Result<Vec<domain::User>, domain::ReadError> {
        Ok(self
            .run(|connection| {
                convert_all(query_all::<UserRow, _>(
                    connection,
                    &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
                    [],
                )?)
            })
            .await?)
    }

    async fn read_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<domain::User>, domain::ReadError> {
        let email = email.to_string();
        Ok(self
            .run(move |connection| {
                query_optional::<UserRow, _>(
                    connection,
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                )?
                .map(domain::User::try_from)
                .transpose()
            })
            .await?)
    }

    async fn read_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<domain::User>, domain::ReadError> {
        let email = email.to_string();
        let password = password.to_string();
        Ok(self
            .run(move |connection| {
                query_optional::<UserRow, _>(
                    connection,
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND password = ?2"
                    ),
                    [email, password],
                )?
                .map(domain::User::try_from)
                .transpose()
            })
            .await?)
    }

    async fn create_user(&self, user: domain::NewUser) -> Result<domain::User, domain::CreateError> {
        Ok(self
            .write(&[Table::Users], move |connection| {
                unique(
                    connection.execute(
                        "INSERT INTO users (email, password, display_name, registered_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            user.email.as_str(),
                            user.password.as_str(),
                            user.display_name.as_str(),
                            user.registered_at.timestamp_millis(),
                        ],
                    ),
                    domain::Conflict::Email,
                )?;
                let mut user = user.with_id(connection.last_insert_rowid().into());
                user.registered_at = user.registered_at.trunc_subsecs(3);
                Ok(user)
            })
            .await?)
    }

    async fn delete_user(&self, id: domain::UserID) -> Result<domain::UserID, domain::DeleteError> {
        Ok(self
            .write(&[Table::Users], move |connection| {
                connection.execute("DELETE FROM users WHERE id = ?1", [*id])?;
                Ok(id)
            })
            .await?)
    }
}

impl domain::ExerciseRepository for SQLite {
    async fn watch_exercises(
        &self,
        category: Option<domain::Category>,
    ) -> Result<domain::Subscription<Vec<domain::Exercise>>, domain::ReadError> {
        let category = category.map(|c| c.to_string());
        Ok(self
            .watch(&[Table::Exercises], move |connection| {
                read_exercises(connection, category.as_deref())
            })
            .await?)
    }

    async fn read_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<Option<domain::Exercise>, domain::ReadError> {
        Ok(self
            .run(move |connection| {
                query_optional::<ExerciseRow, _>(
                    connection,
                    "SELECT id, name, description, category, duration_minutes, calories, image_ref
                     FROM exercises WHERE id = ?1",
                    [*id],
                )?
                .map(domain::Exercise::try_from)
                .transpose()
            })
            .await?)
    }

    async fn count_exercises(&self) -> Result<u32, domain::ReadError> {
        Ok(self
            .run(|connection| count(connection, "exercises"))
            .await?)
    }

    async fn create_exercise(
        &self,
        exercise: domain::NewExercise,
    ) -> Result<domain::Exercise, domain::CreateError> {
        Ok(self
            .write(&[Table::Exercises], move |connection| {
                connection.execute(
                    "INSERT INTO exercises
                         (name, description, category, duration_minutes, calories, image_ref)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        exercise.name.as_str(),
                        exercise.description,
                        exercise.category.to_string(),
                        exercise.duration_minutes,
                        exercise.calories,
                        exercise.image_ref,
                    ],
                )?;
                Ok(exercise.with_id(connection.last_insert_rowid().into()))
            })
            .await?)
    }

    async fn delete_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        Ok(self
            .write(
                &[Table::Exercises, Table::RoutineExercises],
                move |connection| {
                    let transaction = connection.transaction()?;
                    transaction
                        .execute("DELETE FROM routine_exercises WHERE exercise_id = ?1", [*id])?;
                    transaction.execute("DELETE FROM exercises WHERE id = ?1", [*id])?;
                    transaction.commit()?;
                    Ok(id)
                },
            )
            .await?)
    }
}

impl domain::RoutineRepository for SQLite {
    async fn create_routine(
        &self,
        name: domain::Name,
        description: String,
        exercises: Vec<(domain::ExerciseID, domain::WorkoutParameters)>,
    ) -> Result<domain::Routine, domain::CreateError> {
        Ok(self
            .write(
                &[Table::Routines, Table::RoutineExercises],
                move |connection| {
                    let transaction = connection.transaction()?;

                    for (exercise_id, _) in &exercises {
                        if !exists(&transaction, "exercises", **exercise_id)? {
                            return Err(SQLiteError::NotFound("exercise"));
                        }
                    }

                    transaction.execute(
                        "INSERT INTO routines (name, description) VALUES (?1, ?2)",
                        params![name.as_str(), description],
                    )?;
                    let routine_id = domain::RoutineID::from(transaction.last_insert_rowid());

                    for (exercise_id, parameters) in exercises {
                        write_link(
                            &transaction,
                            UPSERT_LINK,
                            &domain::RoutineExercise {
                                routine_id,
                                exercise_id,
                                parameters,
                            },
                        )?;
                    }

                    transaction.commit()?;

                    Ok(domain::Routine {
                        id: routine_id,
                        name,
                        description,
                    })
                },
            )
            .await?)
    }

    async fn attach_exercise(
        &self,
        link: domain::RoutineExercise,
    ) -> Result<domain::RoutineExercise, domain::CreateError> {
        Ok(self
            .write(&[Table::RoutineExercises], move |connection| {
                let transaction = connection.transaction()?;

                if !exists(&transaction, "routines", *link.routine_id)? {
                    return Err(SQLiteError::NotFound("routine"));
                }
                if !exists(&transaction, "exercises", *link.exercise_id)? {
                    return Err(SQLiteError::NotFound("exercise"));
                }

                unique(
                    write_link(&transaction, INSERT_LINK, &link),
                    domain::Conflict::RoutineExercise,
                )?;

                transaction.commit()?;

                Ok(link)
            })
            .await?)
    }

    async fn upsert_routine_exercise(
        &self,
        link: domain::RoutineExercise,
    ) -> Result<domain::RoutineExercise, domain::CreateError> {
        Ok(self
            .write(&[Table::RoutineExercises], move |connection| {
                let transaction = connection.transaction()?;

                if !exists(&transaction, "routines", *link.routine_id)? {
                    return Err(SQLiteError::NotFound("routine"));
                }
                if !exists(&transaction, "exercises", *link.exercise_id)? {
                    return Err(SQLiteError::NotFound("exercise"));
                }

                write_link(&transaction, UPSERT_LINK, &link)?;
                transaction.commit()?;

                Ok(link)
            })
            .await?)
    }

    async fn watch_routine(
        &self,
        id: domain::RoutineID,
    ) -> Result<domain::Subscription<Option<domain::RoutineWithExercises>>, domain::ReadError>
    {
        Ok(self
            .watch(
                &[Table::Routines, Table::RoutineExercises, Table::Exercises],
                move |connection| Ok(read_routines(connection, Some(*id))?.into_iter().next()),
            )
            .await?)
    }

    async fn watch_routines(
        &self,
    ) -> Result<domain::Subscription<Vec<domain::RoutineWithExercises>>, domain::ReadError> {
        Ok(self
            .watch(
                &[Table::Routines, Table::RoutineExercises, Table::Exercises],
                |connection| read_routines(connection, None),
            )
            .await?)
    }

    async fn count_routines(&self) -> Result<u32, domain::ReadError> {
        Ok(self.run(|connection| count(connection, "routines")).await?)
    }

    async fn delete_routine(
        &self,
        id: domain::RoutineID,
    ) -> Result<domain::RoutineID, domain::DeleteError> {
        Ok(self
            .write(
                &[Table::Routines, Table::RoutineExercises],
                move |connection| {
                    let transaction = connection.transaction()?;
                    transaction
                        .execute("DELETE FROM routine_exercises WHERE routine_id = ?1", [*id])?;
                    transaction.execute("DELETE FROM routines WHERE id = ?1", [*id])?;
                    transaction.commit()?;
                    Ok(id)
                },
            )
            .await?)
    }
}

impl domain::ActivityRepository for SQLite {
    async fn create_activity(
        &self,
        activity: domain::NewActivity,
    ) -> Result<domain::CompletedActivity, domain::CreateError> {
        Ok(self
            .write(&[Table::CompletedActivities], move |connection| {
                connection.execute(
                    "INSERT INTO completed_activities
                         (user_id, exercise_id, exercise_name, completed_at, duration_minutes,
                          calories_burned, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        *activity.user_id,
                        *activity.exercise_id,
                        activity.exercise_name,
                        activity.completed_at.timestamp_millis(),
                        activity.duration_minutes,
                        activity.calories_burned,
                        activity.notes,
                    ],
                )?;
                let mut activity = activity.with_id(connection.last_insert_rowid().into());
                activity.completed_at = activity.completed_at.trunc_subsecs(3);
                Ok(activity)
            })
            .await?)
    }

    async fn watch_activities(
        &self,
        user_id: domain::UserID,
        limit: Option<u32>,
    ) -> Result<domain::Subscription<Vec<domain::CompletedActivity>>, domain::ReadError> {
        Ok(self
            .watch(&[Table::CompletedActivities], move |connection| {
                read_activities(connection, *user_id, limit)
            })
            .await?)
    }

    async fn delete_activity(
        &self,
        id: domain::ActivityID,
    ) -> Result<domain::ActivityID, domain::DeleteError> {
        Ok(self
            .write(&[Table::CompletedActivities], move |connection| {
                connection.execute("DELETE FROM completed_activities WHERE id = ?1", [*id])?;
                Ok(id)
            })
            .await?)
    }

    async fn read_statistics(
        &self,
        user_id: domain::UserID,
        favorites: usize,
    ) -> Result<domain::Statistics, domain::ReadError> {
        Ok(self
            .run(move |connection| {
                let (total_count, total_minutes, total_calories): (i64, i64, i64) = connection
                    .query_row(
                        "SELECT COUNT(*),
                                COALESCE(SUM(duration_minutes), 0),
                                COALESCE(SUM(calories_burned), 0)
                         FROM completed_activities
                         WHERE user_id = ?1",
                        [*user_id],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )?;

                let mut statement = connection.prepare_cached(
                    "SELECT exercise_name, COUNT(*)
                     FROM completed_activities
                     WHERE user_id = ?1
                     GROUP BY exercise_name",
                )?;
                let tally = statement
                    .query_map([*user_id], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(domain::Statistics {
                    total_count: u32::try_from(total_count)
                        .map_err(|err| invalid("statistics", err))?,
                    total_minutes: u64::try_from(total_minutes)
                        .map_err(|err| invalid("statistics", err))?,
                    total_calories: u64::try_from(total_calories)
                        .map_err(|err| invalid("statistics", err))?,
                    favorites: domain::rank_favorites(tally, favorites),
                })
            })
            .await?)
    }
}
