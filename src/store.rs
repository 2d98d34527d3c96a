//! Durable storage for finished workouts and the per-user streak record.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use itertools::Itertools;
use tracing::debug;
use uuid::Uuid;

use crate::db::DB;
use crate::models::{ExerciseCompletion, SessionStatus, UserStreak, WorkoutSession};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a finalized session and returns the stored copy, which
    /// carries the store-assigned id.
    async fn insert_session(&self, session: &WorkoutSession) -> Result<WorkoutSession>;

    /// Recomputes the user's streak and totals from their saved workouts.
    async fn update_streak(&self, user_id: &str) -> Result<UserStreak>;

    /// Most recent sessions for `user_id`, newest `started_at` first.
    async fn list_recent_sessions(&self, user_id: &str, limit: u32) -> Result<Vec<WorkoutSession>>;
}

type SessionRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<f64>,
    Option<i64>,
    Option<String>,
);

type StreakRow = (String, i64, i64, Option<String>, i64, i64, String);

pub struct SqliteSessionStore {
    pool: DB,
}

impl SqliteSessionStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    /// Reads the last computed streak record without recomputing it.
    pub async fn streak(&self, user_id: &str) -> Result<Option<UserStreak>> {
        let row: Option<StreakRow> = sqlx::query_as(
            r#"
            SELECT user_id, current_streak, longest_streak, last_workout_date,
                   total_workouts, total_exercises, updated_at
            FROM user_streaks
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(streak_from_row).transpose()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert_session(&self, session: &WorkoutSession) -> Result<WorkoutSession> {
        let mut stored = session.clone();
        stored.id = Uuid::new_v4().to_string();

        let exercises = serde_json::to_string(&stored.exercises_completed)?;

        sqlx::query(
            r#"
            INSERT INTO workout_sessions
                (id, user_id, plan_id, started_at, completed_at, status,
                 exercises_completed, avg_form_score, user_rating, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.user_id)
        .bind(&stored.plan_id)
        .bind(timestamp(stored.started_at))
        .bind(stored.completed_at.map(timestamp))
        .bind(stored.status.as_str())
        .bind(exercises)
        .bind(stored.avg_form_score)
        .bind(stored.user_rating.map(i64::from))
        .bind(&stored.notes)
        .execute(&self.pool)
        .await
        .context("Failed to insert workout session")?;

        debug!(session_id = %stored.id, temp_id = %session.id, "workout session stored");
        Ok(stored)
    }

    async fn update_streak(&self, user_id: &str) -> Result<UserStreak> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT completed_at, exercises_completed
            FROM workout_sessions
            WHERE user_id = ? AND status = ? AND completed_at IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(SessionStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut workouts = Vec::with_capacity(rows.len());
        for (completed_at, exercises) in rows {
            let completed_at = parse_timestamp(&completed_at)?;
            let exercises: Vec<ExerciseCompletion> =
                serde_json::from_str(&exercises).context("Corrupt exercises_completed column")?;
            workouts.push((completed_at, exercises.len() as u32));
        }

        let streak = compute_streak(user_id, &workouts, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO user_streaks
                (user_id, current_streak, longest_streak, last_workout_date,
                 total_workouts, total_exercises, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                current_streak    = excluded.current_streak,
                longest_streak    = excluded.longest_streak,
                last_workout_date = excluded.last_workout_date,
                total_workouts    = excluded.total_workouts,
                total_exercises   = excluded.total_exercises,
                updated_at        = excluded.updated_at
            "#,
        )
        .bind(&streak.user_id)
        .bind(i64::from(streak.current_streak))
        .bind(i64::from(streak.longest_streak))
        .bind(streak.last_workout_date.map(|d| d.to_string()))
        .bind(i64::from(streak.total_workouts))
        .bind(i64::from(streak.total_exercises))
        .bind(timestamp(streak.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to save user streak")?;

        Ok(streak)
    }

    async fn list_recent_sessions(&self, user_id: &str, limit: u32) -> Result<Vec<WorkoutSession>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, plan_id, started_at, completed_at, status,
                   exercises_completed, avg_form_score, user_rating, notes
            FROM workout_sessions
            WHERE user_id = ?
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(session_from_row).collect()
    }
}

/// Fixed-width UTC text, so lexical order in SQL matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp `{}`", raw))?
        .with_timezone(&Utc))
}

fn session_from_row(row: SessionRow) -> Result<WorkoutSession> {
    let (id, user_id, plan_id, started_at, completed_at, status, exercises, avg_form_score, user_rating, notes) = row;

    Ok(WorkoutSession {
        started_at: parse_timestamp(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        status: status.parse()?,
        exercises_completed: serde_json::from_str(&exercises)
            .with_context(|| format!("Corrupt exercises_completed for session {}", id))?,
        avg_form_score,
        user_rating: user_rating.map(u8::try_from).transpose()?,
        id,
        user_id,
        plan_id,
        notes,
    })
}

fn streak_from_row(row: StreakRow) -> Result<UserStreak> {
    let (user_id, current, longest, last_date, total_workouts, total_exercises, updated_at) = row;

    Ok(UserStreak {
        user_id,
        current_streak: u32::try_from(current)?,
        longest_streak: u32::try_from(longest)?,
        last_workout_date: last_date.as_deref().map(str::parse::<NaiveDate>).transpose()?,
        total_workouts: u32::try_from(total_workouts)?,
        total_exercises: u32::try_from(total_exercises)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Builds the streak record from `(completed_at, distinct exercises)` pairs.
///
/// A streak is a run of consecutive calendar days (UTC) with at least one
/// completed workout. The current streak only counts if its last day is today
/// or yesterday.
pub fn compute_streak(user_id: &str, workouts: &[(DateTime<Utc>, u32)], now: DateTime<Utc>) -> UserStreak {
    let days: Vec<NaiveDate> = workouts
        .iter()
        .map(|(at, _)| at.date_naive())
        .sorted()
        .dedup()
        .collect();

    let mut longest = 0_u32;
    let mut run = 0_u32;
    let mut prev: Option<NaiveDate> = None;
    for day in &days {
        run = match prev {
            Some(p) if *day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }

    let last_workout_date = days.last().copied();
    let today = now.date_naive();
    let current = match last_workout_date {
        Some(last) if today - last <= Duration::days(1) => run,
        _ => 0,
    };

    UserStreak {
        user_id: user_id.to_string(),
        current_streak: current,
        longest_streak: longest,
        last_workout_date,
        total_workouts: workouts.len() as u32,
        total_exercises: workouts.iter().map(|(_, n)| n).sum(),
        updated_at: now,
    }
}
