use ironlog::{FileCache, SqliteSessionStore, WorkoutTracker};

pub mod config;
pub mod history;
pub mod plan;
pub mod workout;

pub type Tracker = WorkoutTracker<SqliteSessionStore, FileCache>;
