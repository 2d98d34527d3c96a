use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ironlog", version, about = "Track workouts against a plan, set by set")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commands for the workout in progress
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// Plan files
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// Show recently saved workouts
    #[command(visible_alias = "h")]
    History,

    /// View or edit ironlog config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum WorkoutCmd {
    /// Start a workout from a plan
    #[command(visible_alias = "s")]
    Start {
        /// Plan name (file stem inside the plans directory)
        plan: String,
    },

    /// Record a completed set - Usage: workout set EXERCISE REPS
    #[command(override_usage = "workout set <EXERCISE> <REPS> [--weight KG] [--form SCORE]")]
    Set {
        /// Exercise id (defaults to the plan's current one when "." is given)
        #[arg(value_name = "EXERCISE")]
        exercise: String,

        /// Number of reps
        #[arg(value_name = "REPS")]
        reps: u32,

        /// Weight used
        #[arg(long, short = 'w')]
        weight: Option<f32>,

        /// Form score, 0-100
        #[arg(long, short = 'f')]
        form: Option<f32>,
    },

    /// Move to the next exercise in the plan
    #[command(visible_alias = "n")]
    Next,

    /// Start a rest period
    #[command(visible_alias = "r")]
    Rest {
        /// Seconds to rest (defaults to the current exercise's prescription)
        seconds: Option<i64>,

        /// Count down in the terminal until the rest is over
        #[arg(long)]
        wait: bool,
    },

    /// End the current rest period early
    EndRest,

    /// Show the workout in progress
    #[command(visible_alias = "i")]
    Show,

    /// Finish and save the workout
    #[command(visible_alias = "f")]
    Finish {
        /// How the workout felt, 1-5
        #[arg(long, short = 'r', value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Free-form notes
        #[arg(long, short = 'n')]
        notes: Option<String>,
    },

    /// Drop the workout in progress without saving it
    Abandon,
}

#[derive(Subcommand)]
pub enum PlanCmd {
    /// List available plans
    #[command(visible_alias = "l")]
    List,

    /// Show a single plan in detail
    #[command(visible_alias = "s")]
    Show {
        /// Plan name
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
