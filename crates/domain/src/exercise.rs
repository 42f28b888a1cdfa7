use std::fmt;

use derive_more::{Deref, Display};

use crate::{CreateError, DeleteError, Name, ReadError, Subscription};

#[allow(async_fn_in_trait)]
pub trait ExerciseService {
    async fn watch_exercises(&self) -> Result<Subscription<Vec<Exercise>>, ReadError>;
    async fn watch_exercises_by_category(
        &self,
        category: Category,
    ) -> Result<Subscription<Vec<Exercise>>, ReadError>;
    async fn get_exercise(&self, id: ExerciseID) -> Result<Option<Exercise>, ReadError>;
    async fn count_exercises(&self) -> Result<u32, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError>;
}

#[allow(async_fn_in_trait)]
pub trait ExerciseRepository {
    /// Live list of exercises ordered by name, optionally restricted to one category.
    async fn watch_exercises(
        &self,
        category: Option<Category>,
    ) -> Result<Subscription<Vec<Exercise>>, ReadError>;
    async fn read_exercise(&self, id: ExerciseID) -> Result<Option<Exercise>, ReadError>;
    async fn count_exercises(&self) -> Result<u32, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
    /// Also removes the exercise from all routines.
    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub description: String,
    pub category: Category,
    pub duration_minutes: u32,
    pub calories: u32,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: Name,
    pub description: String,
    pub category: Category,
    pub duration_minutes: u32,
    pub calories: u32,
    pub image_ref: Option<String>,
}

impl NewExercise {
    #[must_use]
    pub fn with_id(self, id: ExerciseID) -> Exercise {
        Exercise {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            duration_minutes: self.duration_minutes,
            calories: self.calories,
            image_ref: self.image_ref,
        }
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(i64);

impl From<i64> for ExerciseID {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Exercise categories are an open set; unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cardio,
    Strength,
    Flexibility,
    Other(String),
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "Cardio" => Category::Cardio,
            "Strength" => Category::Strength,
            "Flexibility" => Category::Flexibility,
            other => Category::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Category::Cardio => "Cardio",
                Category::Strength => "Strength",
                Category::Flexibility => "Flexibility",
                Category::Other(name) => name,
            }
        )
    }
}
