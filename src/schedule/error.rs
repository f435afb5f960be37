//! Error types for schedule generation.

/// Errors produced while building or checking a schedule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("at least two teams are required, got {0}")]
    NotEnoughTeams(usize),

    #[error("team {0} is listed more than once")]
    DuplicateTeam(String),

    #[error("invalid schedule: {0}")]
    Invalid(String),
}

/// Result type for schedule operations.
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
