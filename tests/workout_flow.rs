use std::fs;
use std::sync::Arc;

use ironlog::{
    FileCache, PlanDir, PlanSource, SessionStatus, SqliteSessionStore, TrackerError, WorkoutTracker,
    db,
};

const PLAN: &str = r#"
id = "upper-a"
name = "Upper A"

[[exercises]]
exercise_id = "row"
name = "Barbell Row"
sets = 2
target_reps = 8
rest_seconds = 90

[[exercises]]
exercise_id = "press"
name = "Overhead Press"
sets = 1
target_reps = 5
rest_seconds = 0
"#;

async fn store() -> Arc<SqliteSessionStore> {
    let pool = db::open("sqlite::memory:").await.unwrap();
    Arc::new(SqliteSessionStore::new(pool))
}

#[tokio::test]
async fn workout_survives_restart_and_is_saved() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("upper.toml"), PLAN).unwrap();
    let plans = PlanDir::new(temp_dir.path());
    let cache_dir = temp_dir.path().join("cache");
    let store = store().await;

    // First process: start and log the first set.
    {
        let mut tracker = WorkoutTracker::new("ana", Arc::clone(&store), FileCache::new(&cache_dir));
        tracker.start(plans.load_plan("upper").unwrap()).unwrap();
        tracker.complete_set("row", 8, Some(60.0), Some(82.0)).unwrap();
        assert_eq!(tracker.cursor().rest_time_remaining, 90);
    }

    // Second process: pick up where the first left off.
    let mut tracker = WorkoutTracker::resume("ana", Arc::clone(&store), FileCache::new(&cache_dir));
    assert!(tracker.is_active());
    assert_eq!(tracker.cursor().current_set, 2);
    assert!(matches!(
        tracker.start(plans.load_plan("upper").unwrap()),
        Err(TrackerError::SessionAlreadyActive { .. })
    ));

    tracker.end_rest();
    tracker.complete_set("row", 7, Some(60.0), Some(78.0)).unwrap();
    tracker.next_exercise();
    tracker.complete_set("press", 5, Some(40.0), None).unwrap();

    let done = tracker.complete_workout(Some(4), Some("felt strong".into())).await.unwrap();
    assert_eq!(done.session.status, SessionStatus::Completed);
    assert_eq!(done.session.avg_form_score, Some(80.0));
    assert!(!done.session.id.starts_with("temp_"));

    let streak = done.streak_update.await.unwrap().unwrap();
    assert_eq!(streak.total_workouts, 1);
    assert_eq!(streak.total_exercises, 2);
    assert_eq!(streak.current_streak, 1);

    // Nothing left to resume.
    let fresh = WorkoutTracker::resume("ana", Arc::clone(&store), FileCache::new(&cache_dir));
    assert!(!fresh.is_active());
    assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 0);

    let recent = fresh.load_recent_workouts().await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, done.session.id);
    assert_eq!(recent[0].sets_for("row").len(), 2);
    assert_eq!(recent[0].notes.as_deref(), Some("felt strong"));
}

#[tokio::test]
async fn abandoned_workout_leaves_no_history() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("upper.toml"), PLAN).unwrap();
    let plans = PlanDir::new(temp_dir.path());
    let store = store().await;

    let mut tracker = WorkoutTracker::new("ana", Arc::clone(&store), FileCache::new(temp_dir.path().join("cache")));
    tracker.start(plans.load_plan("upper").unwrap()).unwrap();
    tracker.complete_set("row", 8, None, None).unwrap();

    let discarded = tracker.abandon_workout().unwrap();
    assert_eq!(discarded.status, SessionStatus::Abandoned);
    assert!(tracker.load_recent_workouts().await.is_empty());
    assert!(store.streak("ana").await.unwrap().is_none());
}
