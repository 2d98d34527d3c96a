use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use itertools::Itertools;

use ironlog::{
    WorkoutSession,
    types::{OutputFmt, emit},
    utils::format_duration,
};

use super::Tracker;

fn pretty_print(sessions: &[WorkoutSession]) {
    if sessions.is_empty() {
        println!("{}", "  (no workouts saved yet)".dimmed());
        return;
    }

    println!("{}", "Recent workouts:".cyan().bold());
    for (i, s) in sessions.iter().enumerate() {
        let rating = s
            .user_rating
            .map(|r| format!(" {}", "★".repeat(usize::from(r))).yellow().to_string())
            .unwrap_or_default();
        let form = s
            .avg_form_score
            .map(|f| format!(" form {:.0}", f))
            .unwrap_or_default();

        println!(
            "{} • {} {} – {} sets, {} reps in {}{}{}",
            format!("{}", i + 1).yellow(),
            s.started_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string().bold(),
            format!("[{}]", s.status.as_str()).dimmed(),
            s.total_sets(),
            s.total_reps(),
            format_duration(s.duration(Utc::now())),
            form.dimmed(),
            rating
        );

        let exercises = s.exercises_completed.iter().map(|c| c.exercise_id.as_str()).join(", ");
        if !exercises.is_empty() {
            println!("    {}", exercises.dimmed());
        }
        if let Some(notes) = &s.notes {
            println!("    {}", notes.italic());
        }
    }
}

pub async fn handle(tracker: &Tracker, fmt: OutputFmt) -> Result<()> {
    let sessions = tracker.load_recent_workouts().await;
    emit(fmt, &sessions, || pretty_print(&sessions));
    Ok(())
}
