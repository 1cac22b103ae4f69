use thiserror::Error;

/// Recoverable failures of engine operations. None of these leave a [DayRecord](super::day::DayRecord)
/// or the registry partially modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("invalid amount `{0}`: expected hours (e.g. 2.5) or a percentage (e.g. 25%)")]
    InvalidAmount(String),

    #[error("invalid date `{0}`: use DD-MM-YYYY, DD/MM/YYYY, YYYY-MM-DD or e.g. \"yesterday\"")]
    InvalidDate(String),

    #[error("invalid day `{0}`: expected mon, tue, wed, thu, fri, sat, sun, daily or weekdays")]
    InvalidDayToken(String),

    #[error("project `{0}` not found")]
    ProjectNotFound(String),

    #[error("excluded obligation `{0}` not found")]
    ObligationNotFound(String),

    #[error("alias `{0}` not found")]
    AliasNotFound(String),

    #[error("no entries to undo")]
    NothingToUndo,

    #[error("cannot determine the last added project")]
    AmbiguousUndo { entries: Vec<(String, f64)> },

    #[error("no remaining time to fill ({available:.1}% available, {tracked:.1}% already tracked)")]
    NoRemainingCapacity { available: f64, tracked: f64 },
}
