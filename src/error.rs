//! Errors surfaced by the workout tracker.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// A mutating operation was called with nothing in progress.
    #[error("no workout in progress")]
    NoActiveSession,

    /// `start` was called while another workout is still running.
    #[error("workout {session_id} is still in progress; finish or abandon it first")]
    SessionAlreadyActive { session_id: String },

    #[error("plan has no exercises")]
    EmptyPlan,

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("form score {0} is outside 0-100")]
    InvalidFormScore(f32),

    /// The session store rejected the finalized session. The workout is still
    /// active and can be finished again.
    #[error("failed to save workout: {0:#}")]
    Persistence(anyhow::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
