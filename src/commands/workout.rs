use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use ironlog::{
    Cursor, PlanDir, PlanSource, RestTick, TrackerError, WorkoutPlan, WorkoutSession,
    types::{OutputFmt, emit},
    utils::{format_duration, format_rest},
};

use super::Tracker;
use crate::cli::WorkoutCmd;

#[derive(Serialize)]
struct WorkoutJson<'a> {
    session: &'a WorkoutSession,
    plan: &'a WorkoutPlan,
    cursor: Cursor,
}

pub async fn handle(cmd: WorkoutCmd, tracker: &mut Tracker, plans: &PlanDir, fmt: OutputFmt) -> Result<()> {
    match cmd {
        WorkoutCmd::Start { plan } => {
            let plan = match plans.load_plan(&plan) {
                Ok(p) => p,
                Err(e) => {
                    println!("{} {:#}", "error:".red().bold(), e);
                    return Ok(());
                }
            };

            match tracker.start(plan) {
                Ok(()) => {
                    println!("{} workout started", "ok:".green().bold());
                    print_workout(tracker);
                }
                Err(e) => report(&e),
            }
        }

        WorkoutCmd::Set { exercise, reps, weight, form } => {
            let exercise = if exercise == "." {
                match tracker.current_exercise() {
                    Some(ex) => ex.exercise_id.clone(),
                    None => {
                        report(&TrackerError::NoActiveSession);
                        return Ok(());
                    }
                }
            } else {
                exercise
            };

            if let Err(e) = tracker.complete_set(&exercise, reps, weight, form) {
                report(&e);
                return Ok(());
            }

            let done = tracker.session().map(|s| s.sets_for(&exercise).len()).unwrap_or(0);
            let weight_display = weight.map(|w| format!("{}kg × ", w)).unwrap_or_default();
            println!(
                "{} {} set {} – {}{} reps",
                "ok:".green().bold(),
                exercise.bold(),
                done,
                weight_display,
                reps
            );

            let cursor = tracker.cursor();
            if cursor.is_resting {
                println!(
                    "{} rest {} before set {}",
                    "info:".blue().bold(),
                    format_rest(cursor.rest_time_remaining),
                    cursor.current_set
                );
            } else if let Some(ex) = tracker.current_exercise() {
                println!(
                    "{} all {} sets of {} logged – `workout next` to move on",
                    "info:".blue().bold(),
                    ex.sets,
                    ex.label().bold()
                );
            }
        }

        WorkoutCmd::Next => {
            if !tracker.is_active() {
                report(&TrackerError::NoActiveSession);
                return Ok(());
            }

            let before = tracker.cursor().exercise_index;
            tracker.next_exercise();

            match tracker.current_exercise() {
                Some(ex) if tracker.cursor().exercise_index != before => println!(
                    "{} now on {} – {} × {}",
                    "ok:".green().bold(),
                    ex.label().bold(),
                    ex.sets,
                    ex.target_reps
                ),
                _ => println!("{} already on the last exercise", "warning:".yellow().bold()),
            }
        }

        WorkoutCmd::Rest { seconds, wait } => {
            let seconds = match rest_length(tracker, seconds) {
                Ok(s) => s,
                Err(e) => {
                    report(&e);
                    return Ok(());
                }
            };

            tracker.start_rest(seconds);
            println!(
                "{} resting {}",
                "ok:".green().bold(),
                format_rest(tracker.cursor().rest_time_remaining)
            );

            if wait {
                count_down(tracker).await;
            }
        }

        WorkoutCmd::EndRest => {
            if !tracker.is_active() {
                report(&TrackerError::NoActiveSession);
                return Ok(());
            }

            tracker.end_rest();
            println!("{} rest over", "ok:".green().bold());
        }

        WorkoutCmd::Show => {
            let tracker: &Tracker = tracker;
            match (tracker.session(), tracker.plan()) {
                (Some(session), Some(plan)) => {
                    let json = WorkoutJson {
                        session,
                        plan,
                        cursor: tracker.cursor(),
                    };
                    emit(fmt, &json, || print_workout(tracker));
                }
                _ => println!("{} no workout in progress", "error:".red().bold()),
            }
        }

        WorkoutCmd::Finish { rating, notes } => {
            let done = match tracker.complete_workout(rating, notes).await {
                Ok(done) => done,
                Err(e @ TrackerError::Persistence(_)) => {
                    report(&e);
                    println!(
                        "{} your sets are kept – run `workout finish` again to retry",
                        "info:".blue().bold()
                    );
                    return Ok(());
                }
                Err(e) => {
                    report(&e);
                    return Ok(());
                }
            };

            let s = &done.session;
            println!(
                "{} workout saved (id: {}) – {} sets, {} reps in {}",
                "ok:".green().bold(),
                s.id,
                s.total_sets(),
                s.total_reps(),
                format_duration(s.duration(Utc::now()))
            );
            if let Some(avg) = s.avg_form_score {
                println!("  avg form: {:.1}", avg);
            }

            if let Ok(Some(streak)) = done.streak_update.await {
                println!(
                    "  streak: {} {} (best {}, {} workouts total)",
                    streak.current_streak.to_string().yellow().bold(),
                    if streak.current_streak == 1 { "day" } else { "days" },
                    streak.longest_streak,
                    streak.total_workouts
                );
            }
        }

        WorkoutCmd::Abandon => match tracker.abandon_workout() {
            Some(s) => println!(
                "{} workout abandoned (id: {}, {} sets discarded)",
                "ok:".green().bold(),
                s.id,
                s.total_sets()
            ),
            None => println!("{} no workout to abandon", "error:".red().bold()),
        },
    }

    Ok(())
}

/// Rest length for `workout rest`: the given seconds, or the current exercise's rest.
fn rest_length(tracker: &Tracker, seconds: Option<i64>) -> Result<i64, TrackerError> {
    if !tracker.is_active() {
        return Err(TrackerError::NoActiveSession);
    }

    Ok(seconds
        .or_else(|| tracker.current_exercise().map(|e| i64::from(e.rest_seconds)))
        .unwrap_or(0))
}

fn report(e: &TrackerError) {
    println!("{} {}", "error:".red().bold(), e);
}

async fn count_down(tracker: &mut Tracker) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        match tracker.tick(1) {
            RestTick::Remaining(left) => {
                print!("\r{} {}  ", "rest".cyan().bold(), format_rest(left));
                let _ = std::io::stdout().flush();
            }
            RestTick::Finished => {
                println!("\r{} rest over, next set!  ", "ok:".green().bold());
                break;
            }
            RestTick::Idle => break,
        }
    }
}

fn print_workout(tracker: &Tracker) {
    let (Some(session), Some(plan)) = (tracker.session(), tracker.plan()) else {
        return;
    };
    let cursor = tracker.cursor();

    println!(
        "{} {} (started {}, elapsed {})",
        "Workout:".cyan().bold(),
        plan.name.bold(),
        session.started_at.with_timezone(&chrono::Local).format("%H:%M"),
        format_duration(session.duration(Utc::now()))
    );

    println!("\n{}", "Exercises:".cyan().bold());
    for (i, ex) in plan.exercises.iter().enumerate() {
        let marker = if i == cursor.exercise_index { "▶".green().bold() } else { " ".normal() };
        let idx = format!("{}", i + 1).yellow();
        let logged = session.sets_for(&ex.exercise_id);
        println!(
            "{} {} • {} – {} × {}, rest {} {}",
            marker,
            idx,
            ex.label().bold(),
            ex.sets,
            ex.target_reps,
            format_rest(ex.rest_seconds),
            format!("[{}/{}]", logged.len(), ex.sets).dimmed()
        );

        for (n, set) in logged.iter().enumerate() {
            let weight = set.weight.map(|w| format!("{}kg × ", w)).unwrap_or_default();
            let form = set
                .form_score
                .map(|f| format!(" (form {:.0})", f).dimmed().to_string())
                .unwrap_or_default();
            println!("      Set {}: {}{}{}", n + 1, weight, set.reps, form);
        }
    }

    let unplanned: Vec<_> = session
        .exercises_completed
        .iter()
        .filter(|c| !plan.exercises.iter().any(|e| e.exercise_id == c.exercise_id))
        .collect();
    if !unplanned.is_empty() {
        println!("\n{}", "Unplanned:".cyan().bold());
        for c in unplanned {
            println!("    • {} – {} sets", c.exercise_id.bold(), c.sets_completed.len());
        }
    }

    println!();
    if cursor.is_resting {
        println!("{} resting, {} left", "Status:".cyan().bold(), format_rest(cursor.rest_time_remaining));
    } else {
        println!("{} set {} up next", "Status:".cyan().bold(), cursor.current_set);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ironlog::{FileCache, PlannedExercise, SqliteSessionStore, WorkoutTracker, db};

    use super::*;

    fn plan() -> WorkoutPlan {
        WorkoutPlan {
            id: "legs".into(),
            name: "Legs".into(),
            estimated_minutes: None,
            exercises: vec![PlannedExercise {
                exercise_id: "squat".into(),
                name: None,
                sets: 3,
                target_reps: 5,
                rest_seconds: 120,
                notes: None,
            }],
        }
    }

    #[tokio::test]
    async fn rest_needs_an_active_workout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = db::open("sqlite::memory:").await.unwrap();
        let store = Arc::new(SqliteSessionStore::new(pool));
        let mut tracker: Tracker = WorkoutTracker::new("ana", store, FileCache::new(temp_dir.path()));

        assert!(matches!(rest_length(&tracker, Some(30)), Err(TrackerError::NoActiveSession)));
        assert!(matches!(rest_length(&tracker, None), Err(TrackerError::NoActiveSession)));
        assert!(!tracker.cursor().is_resting);

        tracker.start(plan()).unwrap();
        assert_eq!(rest_length(&tracker, Some(30)).unwrap(), 30);
        assert_eq!(rest_length(&tracker, None).unwrap(), 120);
    }
}
