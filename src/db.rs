use std::str::FromStr;

use anyhow::{Result, bail};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS workout_sessions (
    id                  TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    plan_id             TEXT NOT NULL,
    started_at          TEXT NOT NULL,
    completed_at        TEXT,
    status              TEXT NOT NULL,
    exercises_completed TEXT NOT NULL,
    avg_form_score      REAL,
    user_rating         INTEGER,
    notes               TEXT
);

CREATE INDEX IF NOT EXISTS idx_workout_sessions_user_started
    ON workout_sessions (user_id, started_at DESC);

CREATE TABLE IF NOT EXISTS user_streaks (
    user_id           TEXT PRIMARY KEY,
    current_streak    INTEGER NOT NULL,
    longest_streak    INTEGER NOT NULL,
    last_workout_date TEXT,
    total_workouts    INTEGER NOT NULL,
    total_exercises   INTEGER NOT NULL,
    updated_at        TEXT NOT NULL
);
"#;

pub async fn open(path: &str) -> Result<DB> {
    if path.trim().is_empty() {
        bail!("database path must not be empty");
    }
    let opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

    // An in-memory database lives per connection, so keep exactly one.
    let in_memory = path.contains(":memory:");
    let mut pool_opts = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
    if in_memory {
        pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_opts.connect_with(opts).await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    Ok(pool)
}
