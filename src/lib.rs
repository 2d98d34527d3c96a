//! Workout session tracking: walk a plan set by set, count rest periods, and
//! persist the finished session with its aggregate statistics.

pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod plan;
pub mod store;
pub mod tracker;
pub mod types;
pub mod utils;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use error::{TrackerError, TrackerResult};
pub use models::{Cursor, PlannedExercise, SessionStatus, SetRecord, UserStreak, WorkoutPlan, WorkoutSession};
pub use plan::{PlanDir, PlanSource};
pub use store::{SessionStore, SqliteSessionStore};
pub use tracker::{CompletedWorkout, RestTick, WorkoutTracker};
