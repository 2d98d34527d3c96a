//! The active workout: cursor over the plan, recorded sets, rest countdown and
//! finalization.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{self, LocalCache};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Cursor, PlannedExercise, SessionStatus, SetRecord, UserStreak, WorkoutPlan, WorkoutSession};
use crate::store::SessionStore;

pub const WORKOUT_KEY: &str = "current_workout";
pub const PLAN_KEY: &str = "current_plan";
pub const CURSOR_KEY: &str = "current_cursor";

/// Default number of sessions returned by
/// [`WorkoutTracker::load_recent_workouts`].
pub const RECENT_LIMIT: u32 = 10;

/// Outcome of advancing the rest countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestTick {
    /// Not resting, nothing to count down.
    Idle,
    Remaining(u32),
    /// The rest period just ran out and has been ended.
    Finished,
}

/// Result of a successful [`WorkoutTracker::complete_workout`].
#[derive(Debug)]
pub struct CompletedWorkout {
    /// The session as persisted, carrying the store-assigned id.
    pub session: WorkoutSession,
    /// Background streak recalculation. Await it to see the new streak, or
    /// drop it to let it finish on its own; `None` means it failed.
    pub streak_update: JoinHandle<Option<UserStreak>>,
}

struct Active {
    session: WorkoutSession,
    plan: WorkoutPlan,
}

pub struct WorkoutTracker<S, C> {
    user_id: String,
    store: Arc<S>,
    cache: C,
    active: Option<Active>,
    cursor: Cursor,
    recent_limit: u32,
}

impl<S, C> WorkoutTracker<S, C>
where
    S: SessionStore + 'static,
    C: LocalCache,
{
    pub fn new(user_id: impl Into<String>, store: Arc<S>, cache: C) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            cache,
            active: None,
            cursor: Cursor::default(),
            recent_limit: RECENT_LIMIT,
        }
    }

    pub fn with_recent_limit(mut self, limit: u32) -> Self {
        self.recent_limit = limit.max(1);
        self
    }

    /// Rebuilds tracker state from the local cache after an interruption.
    ///
    /// Falls back to an empty tracker when the cached workout is missing,
    /// unreadable or no longer in progress.
    pub fn resume(user_id: impl Into<String>, store: Arc<S>, cache: C) -> Self {
        let mut tracker = Self::new(user_id, store, cache);

        let session = cache::read_json::<_, WorkoutSession>(&tracker.cache, WORKOUT_KEY);
        let plan = cache::read_json::<_, WorkoutPlan>(&tracker.cache, PLAN_KEY);

        match (session, plan) {
            (Ok(Some(session)), Ok(Some(plan)))
                if session.status == SessionStatus::InProgress && !plan.exercises.is_empty() =>
            {
                let mut cursor = cache::read_json::<_, Cursor>(&tracker.cache, CURSOR_KEY)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "discarding unreadable cached cursor");
                        None
                    })
                    .unwrap_or_default();

                if cursor.exercise_index >= plan.exercises.len() {
                    cursor = Cursor::default();
                }
                let sets = plan.exercises[cursor.exercise_index].sets;
                if cursor.current_set == 0 || cursor.current_set > sets {
                    cursor.current_set = 1;
                }

                info!(session_id = %session.id, plan_id = %plan.id, "resumed workout from cache");
                tracker.cursor = cursor;
                tracker.active = Some(Active { session, plan });
            }
            (Ok(None), Ok(None)) => {}
            (session, plan) => {
                if let Err(e) = session.as_ref().and(plan.as_ref()) {
                    warn!(error = %e, "discarding unreadable cached workout");
                } else {
                    debug!("discarding incomplete cached workout");
                }
                tracker.purge_cache();
            }
        }

        tracker
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn plan(&self) -> Option<&WorkoutPlan> {
        self.active.as_ref().map(|a| &a.plan)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The plan exercise the cursor points at.
    pub fn current_exercise(&self) -> Option<&PlannedExercise> {
        self.plan()
            .and_then(|p| p.exercises.get(self.cursor.exercise_index))
    }

    /// Begins a workout on `plan`. Refuses to replace a workout in progress.
    pub fn start(&mut self, plan: WorkoutPlan) -> TrackerResult<()> {
        if plan.exercises.is_empty() {
            return Err(TrackerError::EmptyPlan);
        }
        plan.validate().map_err(TrackerError::InvalidPlan)?;

        if let Some(active) = &self.active {
            return Err(TrackerError::SessionAlreadyActive {
                session_id: active.session.id.clone(),
            });
        }

        let session = WorkoutSession::new(
            format!("temp_{}", Uuid::new_v4().simple()),
            self.user_id.clone(),
            plan.id.clone(),
            Utc::now(),
        );

        info!(session_id = %session.id, plan_id = %plan.id, exercises = plan.exercises.len(), "workout started");

        self.active = Some(Active { session, plan });
        self.cursor = Cursor::default();

        self.cache_session();
        if let Some(active) = &self.active {
            self.cache_write(PLAN_KEY, &active.plan);
        }
        self.cache_cursor();
        Ok(())
    }

    /// Records a set for `exercise_id` and moves the cursor.
    ///
    /// The last-set check looks at the exercise under the cursor, not at
    /// `exercise_id`, which may name any exercise (even one outside the plan).
    pub fn complete_set(
        &mut self,
        exercise_id: &str,
        reps: u32,
        weight: Option<f32>,
        form_score: Option<f32>,
    ) -> TrackerResult<()> {
        if let Some(score) = form_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(TrackerError::InvalidFormScore(score));
            }
        }

        let active = self.active.as_mut().ok_or(TrackerError::NoActiveSession)?;
        active
            .session
            .record_set(exercise_id, SetRecord::new(reps, weight, form_score));

        let current = &active.plan.exercises[self.cursor.exercise_index];
        let is_last_set = self.cursor.current_set >= current.sets;
        let rest_seconds = current.rest_seconds;

        debug!(
            session_id = %active.session.id,
            exercise_id,
            set = self.cursor.current_set,
            reps,
            is_last_set,
            "set completed"
        );

        if is_last_set {
            self.cursor.current_set = 1;
        } else {
            self.cursor.current_set += 1;
            self.start_rest(i64::from(rest_seconds));
        }

        self.cache_session();
        self.cache_cursor();
        Ok(())
    }

    /// Moves to the next plan exercise. Does nothing on the last one.
    pub fn next_exercise(&mut self) {
        let Some(active) = &self.active else {
            return;
        };

        let next = self.cursor.exercise_index + 1;
        if next < active.plan.exercises.len() {
            self.cursor.exercise_index = next;
            self.cursor.current_set = 1;
            self.cache_cursor();
        }
    }

    /// Starts a rest period. Zero or negative lengths count as already over.
    pub fn start_rest(&mut self, seconds: i64) {
        self.cursor.is_resting = true;
        self.cursor.rest_time_remaining = u32::try_from(seconds.max(0)).unwrap_or(u32::MAX);
        self.cache_cursor();
    }

    pub fn end_rest(&mut self) {
        self.cursor.is_resting = false;
        self.cursor.rest_time_remaining = 0;
        self.cache_cursor();
    }

    /// Counts the rest timer down by `elapsed_seconds`, ending the rest when
    /// it reaches zero. Driven by an external periodic tick.
    pub fn tick(&mut self, elapsed_seconds: u32) -> RestTick {
        if !self.cursor.is_resting {
            return RestTick::Idle;
        }

        let remaining = self.cursor.rest_time_remaining.saturating_sub(elapsed_seconds);
        if remaining == 0 {
            self.end_rest();
            RestTick::Finished
        } else {
            self.cursor.rest_time_remaining = remaining;
            RestTick::Remaining(remaining)
        }
    }

    /// Finalizes and persists the workout.
    ///
    /// On a store failure the workout stays active with every recorded set,
    /// so finishing can be retried.
    pub async fn complete_workout(
        &mut self,
        rating: Option<u8>,
        notes: Option<String>,
    ) -> TrackerResult<CompletedWorkout> {
        let active = self.active.as_ref().ok_or(TrackerError::NoActiveSession)?;

        let mut finished = active.session.clone();
        finished.completed_at = Some(Utc::now());
        finished.status = SessionStatus::Completed;
        finished.user_rating = rating;
        finished.notes = notes;
        finished.avg_form_score = finished.average_form_score();

        let stored = match self.store.insert_session(&finished).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(session_id = %finished.id, error = %e, "failed to save workout; keeping it active");
                return Err(TrackerError::Persistence(e));
            }
        };

        info!(
            session_id = %stored.id,
            sets = stored.total_sets(),
            avg_form_score = ?stored.avg_form_score,
            "workout completed"
        );

        let store = Arc::clone(&self.store);
        let user_id = stored.user_id.clone();
        let streak_update = tokio::spawn(async move {
            match store.update_streak(&user_id).await {
                Ok(streak) => Some(streak),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "streak update failed");
                    None
                }
            }
        });

        self.clear();
        Ok(CompletedWorkout {
            session: stored,
            streak_update,
        })
    }

    /// Drops the workout in progress without saving anything.
    ///
    /// Returns the discarded session marked abandoned, if there was one.
    pub fn abandon_workout(&mut self) -> Option<WorkoutSession> {
        let discarded = self.active.take().map(|a| {
            let mut session = a.session;
            session.status = SessionStatus::Abandoned;
            session.completed_at = Some(Utc::now());
            session
        });

        if let Some(session) = &discarded {
            info!(session_id = %session.id, sets = session.total_sets(), "workout abandoned");
        }

        self.clear();
        discarded
    }

    /// Recent workouts for this user, newest first. Empty on any failure.
    pub async fn load_recent_workouts(&self) -> Vec<WorkoutSession> {
        match self.store.list_recent_sessions(&self.user_id, self.recent_limit).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "failed to load recent workouts");
                Vec::new()
            }
        }
    }

    fn clear(&mut self) {
        self.active = None;
        self.cursor = Cursor::default();
        self.purge_cache();
    }

    fn purge_cache(&self) {
        for key in [WORKOUT_KEY, PLAN_KEY, CURSOR_KEY] {
            if let Err(e) = self.cache.delete(key) {
                debug!(key, error = %e, "cache delete failed");
            }
        }
    }

    fn cache_session(&self) {
        if let Some(active) = &self.active {
            self.cache_write(WORKOUT_KEY, &active.session);
        }
    }

    fn cache_cursor(&self) {
        if self.active.is_some() {
            self.cache_write(CURSOR_KEY, &self.cursor);
        }
    }

    fn cache_write<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = cache::put_json(&self.cache, key, value) {
            debug!(key, error = %e, "cache write failed");
        }
    }
}
