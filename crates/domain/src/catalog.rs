//! Exercises and routines every new installation starts with.

use crate::{Category, WorkoutParameters};

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogExercise {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub duration_minutes: u32,
    pub calories: u32,
}

impl CatalogExercise {
    #[must_use]
    pub fn category(&self) -> Category {
        Category::from(self.category)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRoutine {
    pub name: &'static str,
    pub description: &'static str,
    /// Exercises are referenced by their catalog name.
    pub exercises: &'static [(&'static str, WorkoutParameters)],
}

pub const STARTER_EXERCISES: [CatalogExercise; 9] = [
    CatalogExercise {
        name: "Running",
        description: "Jog at a moderate pace",
        category: "Cardio",
        duration_minutes: 30,
        calories: 300,
    },
    CatalogExercise {
        name: "Jump Rope",
        description: "High intensity",
        category: "Cardio",
        duration_minutes: 15,
        calories: 200,
    },
    CatalogExercise {
        name: "Cycling",
        description: "Continuous pedaling",
        category: "Cardio",
        duration_minutes: 45,
        calories: 400,
    },
    CatalogExercise {
        name: "Push-ups",
        description: "Chest and arms",
        category: "Strength",
        duration_minutes: 10,
        calories: 80,
    },
    CatalogExercise {
        name: "Squats",
        description: "Legs and glutes",
        category: "Strength",
        duration_minutes: 15,
        calories: 120,
    },
    CatalogExercise {
        name: "Plank",
        description: "Isometric core exercise",
        category: "Strength",
        duration_minutes: 5,
        calories: 50,
    },
    CatalogExercise {
        name: "Yoga",
        description: "Poses for flexibility",
        category: "Flexibility",
        duration_minutes: 30,
        calories: 150,
    },
    CatalogExercise {
        name: "Stretching",
        description: "Full-body stretching routine",
        category: "Flexibility",
        duration_minutes: 20,
        calories: 60,
    },
    CatalogExercise {
        name: "Pilates",
        description: "Control and flexibility",
        category: "Flexibility",
        duration_minutes: 40,
        calories: 200,
    },
];

pub const STARTER_ROUTINES: [CatalogRoutine; 1] = [CatalogRoutine {
    name: "Beginner Strength Routine",
    description: "A basic routine to start building strength.",
    exercises: &[
        ("Push-ups", WorkoutParameters::strength(3, 10, 0.0)),
        ("Squats", WorkoutParameters::strength(3, 12, 20.0)),
        ("Plank", WorkoutParameters::timed(60)),
    ],
}];

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_starter_exercises_unique_names() {
        let names = STARTER_EXERCISES
            .iter()
            .map(|e| e.name)
            .collect::<BTreeSet<_>>();
        assert_eq!(names.len(), STARTER_EXERCISES.len());
    }

    #[test]
    fn test_starter_exercises_per_category() {
        let mut per_category: BTreeMap<Category, usize> = BTreeMap::new();
        for exercise in &STARTER_EXERCISES {
            *per_category.entry(exercise.category()).or_default() += 1;
        }
        assert_eq!(
            per_category,
            BTreeMap::from([
                (Category::Cardio, 3),
                (Category::Strength, 3),
                (Category::Flexibility, 3),
            ])
        );
    }

    #[test]
    fn test_starter_routine_holds_timed_strength_exercise() {
        let (name, parameters) = STARTER_ROUTINES[0].exercises[2];
        let plank = STARTER_EXERCISES.iter().find(|e| e.name == name).unwrap();

        assert_eq!(plank.category(), Category::Strength);
        assert_eq!(parameters, WorkoutParameters::timed(60));
        assert!(!parameters.suits(&plank.category()));
    }

    #[test]
    fn test_starter_routines_reference_catalog() {
        for routine in &STARTER_ROUTINES {
            for (name, parameters) in routine.exercises {
                assert!(
                    STARTER_EXERCISES.iter().any(|e| e.name == *name),
                    "{name} missing from catalog"
                );
                assert!(!parameters.is_empty(), "{name}");
            }
        }
    }
}
