use chrono::DateTime;
use liftlog_domain as domain;

pub const EMAIL: &str = " Alice@Example.com ";
pub const PASSWORD: &str = "secret1";
pub const DISPLAY_NAME: &str = " Alice ";

pub const RUNNING_ID: i64 = 1;
pub const PUSH_UPS_ID: i64 = 4;
pub const SQUATS_ID: i64 = 5;
pub const PLANK_ID: i64 = 6;

pub static NEW_USER: std::sync::LazyLock<domain::NewUser> =
    std::sync::LazyLock::new(|| domain::NewUser {
        email: domain::Email::new("alice@example.com").unwrap(),
        password: domain::Password::new(PASSWORD).unwrap(),
        display_name: domain::Name::new("Alice").unwrap(),
        registered_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
    });

pub static RUNNING: std::sync::LazyLock<domain::Exercise> = std::sync::LazyLock::new(|| {
    exercise(RUNNING_ID, "Running", domain::Category::Cardio, 30, 300)
});

pub static PUSH_UPS: std::sync::LazyLock<domain::Exercise> = std::sync::LazyLock::new(|| {
    exercise(PUSH_UPS_ID, "Push-ups", domain::Category::Strength, 10, 80)
});

pub static SQUATS: std::sync::LazyLock<domain::Exercise> = std::sync::LazyLock::new(|| {
    exercise(SQUATS_ID, "Squats", domain::Category::Strength, 15, 120)
});

pub static PLANK: std::sync::LazyLock<domain::Exercise> =
    std::sync::LazyLock::new(|| exercise(PLANK_ID, "Plank", domain::Category::Strength, 5, 50));

pub static NEW_EXERCISE: std::sync::LazyLock<domain::NewExercise> =
    std::sync::LazyLock::new(|| domain::NewExercise {
        name: domain::Name::new("Kettlebell Swing").unwrap(),
        description: String::from("Hip hinge with a kettlebell"),
        category: domain::Category::Strength,
        duration_minutes: 10,
        calories: 100,
        image_ref: Some(String::from("kettlebell_swing")),
    });

fn exercise(
    id: i64,
    name: &str,
    category: domain::Category,
    duration_minutes: u32,
    calories: u32,
) -> domain::Exercise {
    domain::Exercise {
        id: id.into(),
        name: domain::Name::new(name).unwrap(),
        description: String::new(),
        category,
        duration_minutes,
        calories,
        image_ref: None,
    }
}

pub fn activity(
    user_id: domain::UserID,
    exercise: &domain::Exercise,
    completed_at: i64,
) -> domain::NewActivity {
    domain::NewActivity::snapshot(
        user_id,
        exercise,
        DateTime::from_timestamp_millis(completed_at).unwrap(),
        None,
    )
}
