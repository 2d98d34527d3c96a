use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use strsim::jaro_winkler;

use crate::models::{PlannedExercise, WorkoutPlan};

/// Anything that can hand the tracker a plan to run.
pub trait PlanSource {
    fn load_plan(&self, name: &str) -> Result<WorkoutPlan>;
    fn list_plans(&self) -> Result<Vec<String>>;
}

/// Plans stored as files in one directory, `<name>.toml` or `<name>.json`.
///
/// TOML files hold a `WorkoutPlan` directly. JSON files hold the response of
/// the plan generator (`planId`, `name`, `exercises`, ...).
#[derive(Debug, Clone)]
pub struct PlanDir {
    dir: PathBuf,
}

/// Shape produced by the workout generator endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedPlan {
    plan_id: String,
    name: String,
    exercises: Vec<GeneratedExercise>,
    #[serde(default, rename = "estimated_duration")]
    estimated_duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedExercise {
    exercise_id: String,
    name: String,
    sets: u32,
    target_reps: u32,
    rest_seconds: u32,
    #[serde(default)]
    notes: Option<String>,
}

impl From<GeneratedPlan> for WorkoutPlan {
    fn from(g: GeneratedPlan) -> Self {
        WorkoutPlan {
            id: g.plan_id,
            name: g.name,
            estimated_minutes: g.estimated_duration,
            exercises: g
                .exercises
                .into_iter()
                .map(|e| PlannedExercise {
                    exercise_id: e.exercise_id,
                    name: Some(e.name),
                    sets: e.sets,
                    target_reps: e.target_reps,
                    rest_seconds: e.rest_seconds,
                    notes: e.notes,
                })
                .collect(),
        }
    }
}

impl PlanDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn parse(path: &Path) -> Result<WorkoutPlan> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

        let plan: WorkoutPlan = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<GeneratedPlan>(&content)
                .with_context(|| format!("Invalid plan file: {}", path.display()))?
                .into(),
            _ => toml::from_str(&content).with_context(|| format!("Invalid plan file: {}", path.display()))?,
        };

        plan.validate()
            .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        Ok(plan)
    }
}

impl PlanSource for PlanDir {
    fn load_plan(&self, name: &str) -> Result<WorkoutPlan> {
        for ext in ["toml", "json"] {
            let path = self.dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                return Self::parse(&path);
            }
        }

        let known = self.list_plans().unwrap_or_default();
        match best_plan_suggestion(name, &known) {
            Some(suggestion) => Err(anyhow!("Plan '{}' not found (did you mean '{}'?)", name, suggestion)),
            None => Err(anyhow!("Plan '{}' not found in {}", name, self.dir.display())),
        }
    }

    fn list_plans(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read plan directory: {}", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "toml" || ext == "json")
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect::<Vec<_>>();

        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Closest known plan name if similarity ≥ 0.80 and clearly ahead of the
/// runner-up.
pub fn best_plan_suggestion<'a>(input: &str, known: &'a [String]) -> Option<&'a str> {
    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    let input = input.to_ascii_lowercase();
    let mut scores: Vec<(&str, f64)> = known
        .iter()
        .map(|k| (k.as_str(), jaro_winkler(&input, &k.to_ascii_lowercase())))
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    (best_score >= MIN_SCORE && best_score - second_score >= GAP).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUSH_TOML: &str = r#"
id = "push-a"
name = "Push A"

[[exercises]]
exercise_id = "bench"
name = "Bench Press"
sets = 3
target_reps = 8
rest_seconds = 120

[[exercises]]
exercise_id = "dips"
sets = 2
target_reps = 12
"#;

    const GENERATED_JSON: &str = r#"{
  "planId": "gen-42",
  "name": "Quick Legs",
  "exercises": [
    { "exercise_id": "squat", "name": "Back Squat", "sets": 4, "target_reps": 6, "rest_seconds": 150 },
    { "exercise_id": "lunge", "name": "Walking Lunge", "sets": 3, "target_reps": 10, "rest_seconds": 60, "notes": "per leg" }
  ],
  "estimated_duration": 35,
  "estimated_calories": 280
}"#;

    #[test]
    fn loads_toml_and_generated_json_plans() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("push.toml"), PUSH_TOML).unwrap();
        fs::write(temp_dir.path().join("legs.json"), GENERATED_JSON).unwrap();
        let plans = PlanDir::new(temp_dir.path());

        let push = plans.load_plan("push").unwrap();
        assert_eq!(push.id, "push-a");
        assert_eq!(push.estimated_minutes, None);
        assert_eq!(push.exercises.len(), 2);
        assert_eq!(push.exercises[1].rest_seconds, 0);
        assert_eq!(push.exercises[1].label(), "dips");

        let legs = plans.load_plan("legs").unwrap();
        assert_eq!(legs.id, "gen-42");
        assert_eq!(legs.estimated_minutes, Some(35));
        assert_eq!(legs.exercises[0].label(), "Back Squat");
        assert_eq!(legs.exercises[1].notes.as_deref(), Some("per leg"));

        assert_eq!(plans.list_plans().unwrap(), vec!["legs".to_string(), "push".to_string()]);
    }

    #[test]
    fn rejects_plans_without_exercises() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("empty.toml"), "id = \"e\"\nname = \"Empty\"\nexercises = []\n").unwrap();

        let err = PlanDir::new(temp_dir.path()).load_plan("empty").unwrap_err();
        assert!(err.to_string().contains("no exercises"));
    }

    #[test]
    fn missing_plan_suggests_close_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("push.toml"), PUSH_TOML).unwrap();
        fs::write(temp_dir.path().join("legs.json"), GENERATED_JSON).unwrap();

        let err = PlanDir::new(temp_dir.path()).load_plan("pusj").unwrap_err();
        assert!(err.to_string().contains("did you mean 'push'"));

        let err = PlanDir::new(temp_dir.path()).load_plan("cardio").unwrap_err();
        assert!(!err.to_string().contains("did you mean"));
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let plans = PlanDir::new("/definitely/not/here");
        assert!(plans.list_plans().unwrap().is_empty());
    }
}
