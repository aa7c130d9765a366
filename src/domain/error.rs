/// Error type for tracker mutations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("task name already exists: {0}")]
    DuplicateTask(String),
    #[error("subtask name already exists in {task}: {subtask}")]
    DuplicateSubtask { task: String, subtask: String },
    #[error("name must not be empty")]
    EmptyName,
    #[error("add at least one week before creating tasks")]
    NoWeeks,
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("subtask not found in {task}: {subtask}")]
    SubtaskNotFound { task: String, subtask: String },
    #[error("task {task} has no slot for week {week}")]
    WeekNotFound { task: String, week: usize },
    #[error("archived week index {index} is outside 0..={week_count}")]
    ArchiveIndexOutOfRange { index: usize, week_count: usize },
    #[error("time values must be finite numbers, got {0}")]
    NonFiniteValue(f64),
    #[error("too many values for week {week}: expected at most {expected}, got {actual}")]
    SizeMismatch {
        week: usize,
        expected: usize,
        actual: usize,
    },
}

impl TrackerError {
    /// Whether this is a name validation failure the user should be told about
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTask(_) | Self::DuplicateSubtask { .. } | Self::EmptyName | Self::NoWeeks
        )
    }
}

/// Reject NaN and infinities, which JSON cannot store
pub(crate) fn validate_value(value: f64) -> Result<(), TrackerError> {
    if !value.is_finite() {
        return Err(TrackerError::NonFiniteValue(value));
    }
    Ok(())
}

/// Reject empty or whitespace-only names
pub(crate) fn validate_name(name: &str) -> Result<(), TrackerError> {
    if name.trim().is_empty() {
        return Err(TrackerError::EmptyName);
    }
    Ok(())
}
