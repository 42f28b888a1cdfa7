use chrono::Utc;
use log::{debug, error};

use crate::{
    ActivityID, ActivityRepository, ActivityService, Category, CompletedActivity, Conflict,
    CreateError, DeleteError, Email, Exercise, ExerciseID, ExerciseRepository, ExerciseService,
    FAVORITES_LIMIT, LoginError, Name, NewActivity, NewExercise, NewUser, Password, ReadError,
    Routine, RoutineExercise, RoutineID, RoutineRepository, RoutineService, RoutineWithExercises,
    Statistics, Subscription, User, UserID, UserRepository, UserService, ValidationError,
    WorkoutParameters, normalize_email,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

/// Store failures are logged as errors, expected domain failures (invalid
/// input, conflicts, bad credentials) only at debug level.
macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => {
                #[allow(unreachable_patterns)]
                match err {
                    $error::Storage(_) | $error::Other(_) => {
                        error!("failed to {} {}: {err}", $action, $entity);
                    }
                    _ => {
                        debug!("failed to {} {}: {err}", $action, $entity);
                    }
                }
            }
        }
        result
    }};
}

impl<R: UserRepository> Service<R> {
    async fn register_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, CreateError> {
        let normalized_email = normalize_email(email);

        if self
            .repository
            .read_user_by_email(&normalized_email)
            .await?
            .is_some()
        {
            return Err(CreateError::Conflict(Conflict::Email));
        }

        let user = NewUser {
            email: Email::new(&normalized_email).map_err(ValidationError::from)?,
            password: Password::new(password).map_err(ValidationError::from)?,
            display_name: Name::new(display_name).map_err(ValidationError::from)?,
            registered_at: Utc::now(),
        };

        self.repository.create_user(user).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, LoginError> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        // Plaintext comparison, see `Password`.
        self.repository
            .read_user_by_credentials(&normalize_email(email), password)
            .await?
            .ok_or(LoginError::InvalidCredentials)
    }
}

impl<R: UserRepository> UserService for Service<R> {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, CreateError> {
        log_on_error!(
            self.register_user(email, password, display_name),
            CreateError,
            "register",
            "user"
        )
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, LoginError> {
        log_on_error!(
            self.authenticate(email, password),
            LoginError,
            "log in",
            "user"
        )
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ReadError> {
        log_on_error!(
            self.repository.read_user_by_email(&normalize_email(email)),
            ReadError,
            "find",
            "user"
        )
    }

    async fn get_users(&self) -> Result<Vec<User>, ReadError> {
        log_on_error!(self.repository.read_users(), ReadError, "get", "users")
    }

    async fn delete_user(&self, id: UserID) -> Result<UserID, DeleteError> {
        log_on_error!(
            self.repository.delete_user(id),
            DeleteError,
            "delete",
            "user"
        )
    }
}

impl<R: ExerciseRepository> ExerciseService for Service<R> {
    async fn watch_exercises(&self) -> Result<Subscription<Vec<Exercise>>, ReadError> {
        log_on_error!(
            self.repository.watch_exercises(None),
            ReadError,
            "watch",
            "exercises"
        )
    }

    async fn watch_exercises_by_category(
        &self,
        category: Category,
    ) -> Result<Subscription<Vec<Exercise>>, ReadError> {
        log_on_error!(
            self.repository.watch_exercises(Some(category)),
            ReadError,
            "watch",
            "exercises"
        )
    }

    async fn get_exercise(&self, id: ExerciseID) -> Result<Option<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercise(id),
            ReadError,
            "get",
            "exercise"
        )
    }

    async fn count_exercises(&self) -> Result<u32, ReadError> {
        log_on_error!(
            self.repository.count_exercises(),
            ReadError,
            "count",
            "exercises"
        )
    }

    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError> {
        log_on_error!(
            self.repository.create_exercise(exercise),
            CreateError,
            "create",
            "exercise"
        )
    }

    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError> {
        log_on_error!(
            self.repository.delete_exercise(id),
            DeleteError,
            "delete",
            "exercise"
        )
    }
}

impl<R: RoutineRepository> RoutineService for Service<R> {
    async fn create_routine(
        &self,
        name: Name,
        description: String,
        exercise_ids: Vec<ExerciseID>,
    ) -> Result<Routine, CreateError> {
        let exercises = exercise_ids
            .into_iter()
            .map(|id| (id, WorkoutParameters::NONE))
            .collect();
        log_on_error!(
            self.repository.create_routine(name, description, exercises),
            CreateError,
            "create",
            "routine"
        )
    }

    async fn create_routine_with_parameters(
        &self,
        name: Name,
        description: String,
        exercises: Vec<(ExerciseID, WorkoutParameters)>,
    ) -> Result<Routine, CreateError> {
        log_on_error!(
            self.repository.create_routine(name, description, exercises),
            CreateError,
            "create",
            "routine"
        )
    }

    async fn attach_exercise(
        &self,
        routine_id: RoutineID,
        exercise_id: ExerciseID,
        parameters: WorkoutParameters,
    ) -> Result<RoutineExercise, CreateError> {
        log_on_error!(
            self.repository.attach_exercise(RoutineExercise {
                routine_id,
                exercise_id,
                parameters,
            }),
            CreateError,
            "attach",
            "exercise"
        )
    }

    async fn upsert_routine_exercise(
        &self,
        link: RoutineExercise,
    ) -> Result<RoutineExercise, CreateError> {
        log_on_error!(
            self.repository.upsert_routine_exercise(link),
            CreateError,
            "upsert",
            "routine exercise"
        )
    }

    async fn watch_routine(
        &self,
        id: RoutineID,
    ) -> Result<Subscription<Option<RoutineWithExercises>>, ReadError> {
        log_on_error!(
            self.repository.watch_routine(id),
            ReadError,
            "watch",
            "routine"
        )
    }

    async fn watch_routines(&self) -> Result<Subscription<Vec<RoutineWithExercises>>, ReadError> {
        log_on_error!(
            self.repository.watch_routines(),
            ReadError,
            "watch",
            "routines"
        )
    }

    async fn count_routines(&self) -> Result<u32, ReadError> {
        log_on_error!(
            self.repository.count_routines(),
            ReadError,
            "count",
            "routines"
        )
    }

    async fn delete_routine(&self, id: RoutineID) -> Result<RoutineID, DeleteError> {
        log_on_error!(
            self.repository.delete_routine(id),
            DeleteError,
            "delete",
            "routine"
        )
    }
}

impl<R: ActivityRepository> ActivityService for Service<R> {
    async fn log_completion(
        &self,
        user_id: UserID,
        exercise: &Exercise,
        notes: Option<String>,
    ) -> Result<CompletedActivity, CreateError> {
        log_on_error!(
            self.repository.create_activity(NewActivity::snapshot(
                user_id,
                exercise,
                Utc::now(),
                notes
            )),
            CreateError,
            "log",
            "completion"
        )
    }

    async fn watch_activities(
        &self,
        user_id: UserID,
    ) -> Result<Subscription<Vec<CompletedActivity>>, ReadError> {
        log_on_error!(
            self.repository.watch_activities(user_id, None),
            ReadError,
            "watch",
            "activities"
        )
    }

    async fn watch_recent_activities(
        &self,
        user_id: UserID,
        limit: u32,
    ) -> Result<Subscription<Vec<CompletedActivity>>, ReadError> {
        log_on_error!(
            self.repository.watch_activities(user_id, Some(limit)),
            ReadError,
            "watch",
            "recent activities"
        )
    }

    async fn delete_activity(&self, id: ActivityID) -> Result<ActivityID, DeleteError> {
        log_on_error!(
            self.repository.delete_activity(id),
            DeleteError,
            "delete",
            "activity"
        )
    }

    async fn get_statistics(&self, user_id: UserID) -> Result<Statistics, ReadError> {
        log_on_error!(
            self.repository.read_statistics(user_id, FAVORITES_LIMIT),
            ReadError,
            "get",
            "statistics"
        )
    }
}
