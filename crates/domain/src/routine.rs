use derive_more::{Deref, Display};

use crate::{
    Category, CreateError, DeleteError, Exercise, ExerciseID, Name, ReadError, Subscription,
};

#[allow(async_fn_in_trait)]
pub trait RoutineService {
    async fn create_routine(
        &self,
        name: Name,
        description: String,
        exercise_ids: Vec<ExerciseID>,
    ) -> Result<Routine, CreateError>;
    async fn create_routine_with_parameters(
        &self,
        name: Name,
        description: String,
        exercises: Vec<(ExerciseID, WorkoutParameters)>,
    ) -> Result<Routine, CreateError>;
    async fn attach_exercise(
        &self,
        routine_id: RoutineID,
        exercise_id: ExerciseID,
        parameters: WorkoutParameters,
    ) -> Result<RoutineExercise, CreateError>;
    async fn upsert_routine_exercise(
        &self,
        link: RoutineExercise,
    ) -> Result<RoutineExercise, CreateError>;
    async fn watch_routine(
        &self,
        id: RoutineID,
    ) -> Result<Subscription<Option<RoutineWithExercises>>, ReadError>;
    async fn watch_routines(&self) -> Result<Subscription<Vec<RoutineWithExercises>>, ReadError>;
    async fn count_routines(&self) -> Result<u32, ReadError>;
    async fn delete_routine(&self, id: RoutineID) -> Result<RoutineID, DeleteError>;
}

#[allow(async_fn_in_trait)]
pub trait RoutineRepository {
    /// Writes the routine and all links in one transaction. Unknown exercise
    /// ids abort the whole operation.
    async fn create_routine(
        &self,
        name: Name,
        description: String,
        exercises: Vec<(ExerciseID, WorkoutParameters)>,
    ) -> Result<Routine, CreateError>;
    /// Fails with a conflict if the exercise is already part of the routine.
    async fn attach_exercise(&self, link: RoutineExercise) -> Result<RoutineExercise, CreateError>;
    async fn upsert_routine_exercise(
        &self,
        link: RoutineExercise,
    ) -> Result<RoutineExercise, CreateError>;
    async fn watch_routine(
        &self,
        id: RoutineID,
    ) -> Result<Subscription<Option<RoutineWithExercises>>, ReadError>;
    async fn watch_routines(&self) -> Result<Subscription<Vec<RoutineWithExercises>>, ReadError>;
    async fn count_routines(&self) -> Result<u32, ReadError>;
    /// Removes the routine together with its links.
    async fn delete_routine(&self, id: RoutineID) -> Result<RoutineID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub id: RoutineID,
    pub name: Name,
    pub description: String,
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoutineID(i64);

impl From<i64> for RoutineID {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Per-routine parameters of an exercise. Any combination may be stored.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WorkoutParameters {
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub duration_seconds: Option<u32>,
}

impl WorkoutParameters {
    pub const NONE: WorkoutParameters = WorkoutParameters {
        sets: None,
        reps: None,
        weight: None,
        duration_seconds: None,
    };

    #[must_use]
    pub const fn strength(sets: u32, reps: u32, weight: f64) -> Self {
        Self {
            sets: Some(sets),
            reps: Some(reps),
            weight: Some(weight),
            duration_seconds: None,
        }
    }

    #[must_use]
    pub const fn timed(duration_seconds: u32) -> Self {
        Self {
            sets: None,
            reps: None,
            weight: None,
            duration_seconds: Some(duration_seconds),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Whether exactly the parameters relevant for the category are set.
    ///
    /// Strength exercises take sets, reps and weight; cardio and flexibility
    /// exercises take a duration. Other categories accept anything.
    #[must_use]
    pub fn suits(&self, category: &Category) -> bool {
        match category {
            Category::Strength => {
                self.sets.is_some()
                    && self.reps.is_some()
                    && self.weight.is_some()
                    && self.duration_seconds.is_none()
            }
            Category::Cardio | Category::Flexibility => {
                self.duration_seconds.is_some()
                    && self.sets.is_none()
                    && self.reps.is_none()
                    && self.weight.is_none()
            }
            Category::Other(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineExercise {
    pub routine_id: RoutineID,
    pub exercise_id: ExerciseID,
    pub parameters: WorkoutParameters,
}

/// A routine joined with its exercises.
///
/// `exercises` and `links` are parallel: the link at index `i` belongs to the
/// exercise at index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineWithExercises {
    pub routine: Routine,
    pub exercises: Vec<Exercise>,
    pub links: Vec<RoutineExercise>,
}

impl RoutineWithExercises {
    #[must_use]
    pub fn contains(&self, exercise_id: ExerciseID) -> bool {
        self.links.iter().any(|l| l.exercise_id == exercise_id)
    }

    #[must_use]
    pub fn parameters(&self, exercise_id: ExerciseID) -> Option<&WorkoutParameters> {
        self.links
            .iter()
            .find(|l| l.exercise_id == exercise_id)
            .map(|l| &l.parameters)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Exercise, &WorkoutParameters)> {
        self.exercises
            .iter()
            .zip(self.links.iter().map(|l| &l.parameters))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    static ROUTINE: std::sync::LazyLock<RoutineWithExercises> = std::sync::LazyLock::new(|| {
        RoutineWithExercises {
            routine: Routine {
                id: 1.into(),
                name: Name::new("A").unwrap(),
                description: String::from("B"),
            },
            exercises: vec![exercise(6, "Plank"), exercise(5, "Squats")],
            links: vec![
                RoutineExercise {
                    routine_id: 1.into(),
                    exercise_id: 6.into(),
                    parameters: WorkoutParameters::timed(60),
                },
                RoutineExercise {
                    routine_id: 1.into(),
                    exercise_id: 5.into(),
                    parameters: WorkoutParameters::strength(3, 12, 20.0),
                },
            ],
        }
    });

    fn exercise(id: i64, name: &str) -> Exercise {
        Exercise {
            id: id.into(),
            name: Name::new(name).unwrap(),
            description: String::new(),
            category: Category::Strength,
            duration_minutes: 10,
            calories: 50,
            image_ref: None,
        }
    }

    #[test]
    fn test_routine_contains() {
        assert!(ROUTINE.contains(5.into()));
        assert!(!ROUTINE.contains(4.into()));
    }

    #[test]
    fn test_routine_parameters() {
        assert_eq!(
            ROUTINE.parameters(5.into()),
            Some(&WorkoutParameters::strength(3, 12, 20.0))
        );
        assert_eq!(ROUTINE.parameters(4.into()), None);
    }

    #[test]
    fn test_routine_entries() {
        assert_eq!(
            ROUTINE
                .entries()
                .map(|(e, p)| (e.name.as_str(), p.duration_seconds))
                .collect::<Vec<_>>(),
            vec![("Plank", Some(60)), ("Squats", None)]
        );
    }


    #[test]
    fn test_workout_parameters_weight() {
        let parameters = WorkoutParameters::strength(3, 12, 20.5);
        assert_approx_eq::assert_approx_eq!(parameters.weight.unwrap(), 20.5);
        assert!(!parameters.is_empty());
        assert!(WorkoutParameters::NONE.is_empty());
        assert!(WorkoutParameters::default().is_empty());
    }

    #[rstest]
    #[case(WorkoutParameters::strength(3, 10, 0.0), Category::Strength, true)]
    #[case(WorkoutParameters::timed(60), Category::Strength, false)]
    #[case(WorkoutParameters::NONE, Category::Strength, false)]
    #[case(WorkoutParameters::timed(600), Category::Cardio, true)]
    #[case(WorkoutParameters::timed(300), Category::Flexibility, true)]
    #[case(WorkoutParameters::strength(3, 10, 0.0), Category::Cardio, false)]
    #[case(
        WorkoutParameters { sets: Some(3), ..WorkoutParameters::timed(30) },
        Category::Flexibility,
        false
    )]
    #[case(WorkoutParameters::NONE, Category::Other("Balance".to_string()), true)]
    fn test_workout_parameters_suits(
        #[case] parameters: WorkoutParameters,
        #[case] category: Category,
        #[case] expected: bool,
    ) {
        assert_eq!(parameters.suits(&category), expected);
    }
}
