use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use ironlog::{
    PlanDir, PlanSource, WorkoutPlan,
    types::{OutputFmt, emit},
    utils::format_rest,
};

use crate::cli::PlanCmd;

#[derive(Serialize)]
struct PlanJson {
    idx: usize,
    name: String,
    title: Option<String>,
    exercises: Option<usize>,
    error: Option<String>,
}

fn pretty_print_list(plans: &[PlanJson]) {
    if plans.is_empty() {
        println!("{}", "  (no plans found)".dimmed());
        return;
    }

    println!("{}", "Plans:".cyan().bold());
    let idx_w = plans.len().to_string().len();
    for p in plans {
        let idx = format!("{:>width$}", p.idx, width = idx_w).yellow();
        match (&p.title, p.exercises, &p.error) {
            (Some(title), Some(n), _) => println!(
                " {} • {} {}",
                idx,
                p.name.bold(),
                format!("– {} ({} exercises)", title, n).dimmed()
            ),
            (_, _, Some(err)) => println!(" {} • {} {}", idx, p.name.bold(), err.red()),
            _ => println!(" {} • {}", idx, p.name.bold()),
        }
    }
}

fn pretty_print_plan(plan: &WorkoutPlan) {
    println!("{} {} {}", "Plan:".cyan().bold(), plan.name.bold(), format!("({})", plan.id).dimmed());
    if let Some(minutes) = plan.estimated_minutes {
        println!("{} ~{} min", "Estimated:".cyan().bold(), minutes);
    }
    for (i, ex) in plan.exercises.iter().enumerate() {
        let notes = ex
            .notes
            .as_deref()
            .map(|n| format!(" – {}", n).dimmed().to_string())
            .unwrap_or_default();
        println!(
            "{} • {} — {} × {}, rest {}{}",
            format!("{}", i + 1).yellow(),
            ex.label().bold(),
            ex.sets,
            ex.target_reps,
            format_rest(ex.rest_seconds),
            notes
        );
    }
}

pub async fn handle(cmd: PlanCmd, plans: &PlanDir, fmt: OutputFmt) -> Result<()> {
    match cmd {
        PlanCmd::List => {
            let listed: Vec<PlanJson> = plans
                .list_plans()?
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    let loaded = plans.load_plan(&name);
                    PlanJson {
                        idx: i + 1,
                        title: loaded.as_ref().ok().map(|p| p.name.clone()),
                        exercises: loaded.as_ref().ok().map(|p| p.exercises.len()),
                        error: loaded.err().map(|e| format!("{:#}", e)),
                        name,
                    }
                })
                .collect();

            emit(fmt, &listed, || pretty_print_list(&listed));
        }

        PlanCmd::Show { plan } => match plans.load_plan(&plan) {
            Ok(p) => emit(fmt, &p, || pretty_print_plan(&p)),
            Err(e) => println!("{} {:#}", "error:".red().bold(), e),
        },
    }

    Ok(())
}
