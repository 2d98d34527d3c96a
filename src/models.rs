use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One exercise slot inside a plan, with its prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub sets: u32,
    pub target_reps: u32,
    #[serde(default)]
    pub rest_seconds: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlannedExercise {
    /// Human label: the display name when known, the id otherwise.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.exercise_id)
    }
}

/// Immutable template a session is run against.
/// Exercise order is the traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    /// Expected length in minutes, when the plan's author gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    pub exercises: Vec<PlannedExercise>,
}

impl WorkoutPlan {
    pub fn validate(&self) -> Result<(), String> {
        if self.exercises.is_empty() {
            return Err(format!("plan `{}` has no exercises", self.name));
        }

        for ex in &self.exercises {
            if ex.sets == 0 {
                return Err(format!("exercise `{}` must have at least one set", ex.exercise_id));
            }
            if ex.target_reps == 0 {
                return Err(format!("exercise `{}` must target at least one rep", ex.exercise_id));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            other => anyhow::bail!("unknown session status `{other}`"),
        }
    }
}

/// A single performed set. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub reps: u32,
    pub weight: Option<f32>,
    /// 0-100, computed outside this crate.
    pub form_score: Option<f32>,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
}

impl SetRecord {
    pub fn new(reps: u32, weight: Option<f32>, form_score: Option<f32>) -> Self {
        Self {
            reps,
            weight,
            form_score,
            duration_seconds: None,
            notes: None,
        }
    }
}

/// All sets recorded for one exercise id, in completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCompletion {
    pub exercise_id: String,
    pub sets_completed: Vec<SetRecord>,
}

/// One lived-through attempt at a plan.
/// Mutable while `InProgress`, frozen once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub exercises_completed: Vec<ExerciseCompletion>,
    pub avg_form_score: Option<f64>,
    pub user_rating: Option<u8>,
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub fn new(id: String, user_id: String, plan_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            plan_id,
            started_at,
            completed_at: None,
            status: SessionStatus::InProgress,
            exercises_completed: Vec::new(),
            avg_form_score: None,
            user_rating: None,
            notes: None,
        }
    }

    /// Appends `set` under `exercise_id`, creating the entry on first use.
    pub fn record_set(&mut self, exercise_id: &str, set: SetRecord) {
        match self
            .exercises_completed
            .iter_mut()
            .find(|c| c.exercise_id == exercise_id)
        {
            Some(completion) => completion.sets_completed.push(set),
            None => self.exercises_completed.push(ExerciseCompletion {
                exercise_id: exercise_id.to_string(),
                sets_completed: vec![set],
            }),
        }
    }

    pub fn sets_for(&self, exercise_id: &str) -> &[SetRecord] {
        self.exercises_completed
            .iter()
            .find(|c| c.exercise_id == exercise_id)
            .map(|c| c.sets_completed.as_slice())
            .unwrap_or(&[])
    }

    /// Mean of every recorded form score, `None` when no set carried one.
    pub fn average_form_score(&self) -> Option<f64> {
        let (sum, count) = self
            .exercises_completed
            .iter()
            .flat_map(|c| c.sets_completed.iter())
            .filter_map(|s| s.form_score)
            .fold((0.0_f64, 0_u32), |(sum, n), score| (sum + f64::from(score), n + 1));

        (count > 0).then(|| sum / f64::from(count))
    }

    pub fn total_sets(&self) -> usize {
        self.exercises_completed
            .iter()
            .map(|c| c.sets_completed.len())
            .sum()
    }

    pub fn total_reps(&self) -> u32 {
        self.exercises_completed
            .iter()
            .flat_map(|c| c.sets_completed.iter())
            .map(|s| s.reps)
            .sum()
    }

    /// Elapsed time, up to completion or up to `now` while still running.
    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }
}

/// Where in the plan the user currently is. Transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub exercise_index: usize,
    /// 1-based.
    pub current_set: u32,
    pub is_resting: bool,
    pub rest_time_remaining: u32,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            exercise_index: 0,
            current_set: 1,
            is_resting: false,
            rest_time_remaining: 0,
        }
    }
}

/// Derived per-user training statistics, refreshed after each saved workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStreak {
    pub user_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_workout_date: Option<NaiveDate>,
    pub total_workouts: u32,
    pub total_exercises: u32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WorkoutSession {
        WorkoutSession::new("temp_1".into(), "u1".into(), "p1".into(), Utc::now())
    }

    #[test]
    fn record_set_keeps_first_completion_order() {
        let mut s = session();
        s.record_set("squat", SetRecord::new(5, Some(100.0), None));
        s.record_set("bench", SetRecord::new(8, Some(60.0), None));
        s.record_set("squat", SetRecord::new(4, Some(100.0), None));

        let ids: Vec<_> = s.exercises_completed.iter().map(|c| c.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["squat", "bench"]);
        assert_eq!(s.sets_for("squat").len(), 2);
        assert_eq!(s.sets_for("squat")[1].reps, 4);
        assert_eq!(s.total_sets(), 3);
        assert_eq!(s.total_reps(), 17);
    }

    #[test]
    fn average_form_score_ignores_missing_scores() {
        let mut s = session();
        assert_eq!(s.average_form_score(), None);

        s.record_set("a", SetRecord::new(10, None, None));
        assert_eq!(s.average_form_score(), None);

        s.record_set("a", SetRecord::new(10, None, Some(80.0)));
        s.record_set("b", SetRecord::new(10, None, Some(0.0)));
        s.record_set("b", SetRecord::new(10, None, Some(100.0)));
        assert_eq!(s.average_form_score(), Some(60.0));
    }

    #[test]
    fn validate_rejects_empty_and_zero_prescriptions() {
        let mut plan = WorkoutPlan {
            id: "p".into(),
            name: "push".into(),
            estimated_minutes: None,
            exercises: vec![],
        };
        assert!(plan.validate().is_err());

        plan.exercises.push(PlannedExercise {
            exercise_id: "bench".into(),
            name: None,
            sets: 0,
            target_reps: 8,
            rest_seconds: 90,
            notes: None,
        });
        assert!(plan.validate().is_err());

        plan.exercises[0].sets = 3;
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn status_text_round_trips() {
        for status in [SessionStatus::InProgress, SessionStatus::Completed, SessionStatus::Abandoned] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
    }
}
