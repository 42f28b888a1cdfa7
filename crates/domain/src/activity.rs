use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};

use crate::{
    CreateError, DeleteError, Exercise, ExerciseID, ReadError, Statistics, Subscription, UserID,
};

pub const DEFAULT_RECENT_LIMIT: u32 = 10;

#[allow(async_fn_in_trait)]
pub trait ActivityService {
    async fn log_completion(
        &self,
        user_id: UserID,
        exercise: &Exercise,
        notes: Option<String>,
    ) -> Result<CompletedActivity, CreateError>;
    async fn watch_activities(
        &self,
        user_id: UserID,
    ) -> Result<Subscription<Vec<CompletedActivity>>, ReadError>;
    async fn watch_recent_activities(
        &self,
        user_id: UserID,
        limit: u32,
    ) -> Result<Subscription<Vec<CompletedActivity>>, ReadError>;
    async fn delete_activity(&self, id: ActivityID) -> Result<ActivityID, DeleteError>;
    async fn get_statistics(&self, user_id: UserID) -> Result<Statistics, ReadError>;
}

#[allow(async_fn_in_trait)]
pub trait ActivityRepository {
    async fn create_activity(&self, activity: NewActivity)
    -> Result<CompletedActivity, CreateError>;
    /// Live list of a user's activities, newest first.
    async fn watch_activities(
        &self,
        user_id: UserID,
        limit: Option<u32>,
    ) -> Result<Subscription<Vec<CompletedActivity>>, ReadError>;
    async fn delete_activity(&self, id: ActivityID) -> Result<ActivityID, DeleteError>;
    async fn read_statistics(
        &self,
        user_id: UserID,
        favorites: usize,
    ) -> Result<Statistics, ReadError>;
}

/// A completed exercise.
///
/// Name, duration and calories are copied from the exercise when the
/// activity is logged, so later catalog changes do not alter the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedActivity {
    pub id: ActivityID,
    pub user_id: UserID,
    pub exercise_id: ExerciseID,
    pub exercise_name: String,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_id: UserID,
    pub exercise_id: ExerciseID,
    pub exercise_name: String,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub notes: Option<String>,
}

impl NewActivity {
    #[must_use]
    pub fn snapshot(
        user_id: UserID,
        exercise: &Exercise,
        completed_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            user_id,
            exercise_id: exercise.id,
            exercise_name: exercise.name.to_string(),
            completed_at,
            duration_minutes: exercise.duration_minutes,
            calories_burned: exercise.calories,
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn with_id(self, id: ActivityID) -> CompletedActivity {
        CompletedActivity {
            id,
            user_id: self.user_id,
            exercise_id: self.exercise_id,
            exercise_name: self.exercise_name,
            completed_at: self.completed_at,
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            notes: self.notes,
        }
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActivityID(i64);

impl From<i64> for ActivityID {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{Category, Name};

    use super::*;

    static SQUATS: std::sync::LazyLock<Exercise> = std::sync::LazyLock::new(|| Exercise {
        id: 5.into(),
        name: Name::new("Squats").unwrap(),
        description: String::from("Legs and glutes"),
        category: Category::Strength,
        duration_minutes: 15,
        calories: 120,
        image_ref: None,
    });

    #[test]
    fn test_snapshot() {
        let completed_at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            NewActivity::snapshot(1.into(), &SQUATS, completed_at, Some("felt good".into())),
            NewActivity {
                user_id: 1.into(),
                exercise_id: 5.into(),
                exercise_name: String::from("Squats"),
                completed_at,
                duration_minutes: 15,
                calories_burned: 120,
                notes: Some(String::from("felt good")),
            }
        );
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  "), None)]
    #[case(Some("sore"), Some("sore"))]
    fn test_snapshot_notes(#[case] notes: Option<&str>, #[case] expected: Option<&str>) {
        let activity =
            NewActivity::snapshot(1.into(), &SQUATS, Utc::now(), notes.map(str::to_string));
        assert_eq!(activity.notes.as_deref(), expected);
    }

    #[test]
    fn test_with_id() {
        let activity = NewActivity::snapshot(1.into(), &SQUATS, Utc::now(), None).with_id(3.into());
        assert_eq!(activity.id, ActivityID::from(3));
        assert_eq!(activity.exercise_name, "Squats");
    }
}
