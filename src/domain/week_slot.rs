use super::error::{validate_value, TrackerError};
use tracing::{debug, error};

/// Time tracked against one task in one week.
///
/// `time_tracked` is positionally aligned to the owning task's subtasks. A slot
/// created before a subtask existed is shorter than the subtask list and reads
/// as zero for the missing positions.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSlot {
    /// Global week number this slot belongs to
    pub index: usize,
    /// One value per subtask, in subtask order
    pub time_tracked: Vec<f64>,
}

impl WeekSlot {
    pub fn new(index: usize, time_tracked: Vec<f64>) -> Self {
        Self {
            index,
            time_tracked,
        }
    }

    /// An all-zero slot with one entry per subtask
    pub fn zeroed(index: usize, subtask_count: usize) -> Self {
        Self::new(index, vec![0.0; subtask_count])
    }

    /// Append a blank entry for a newly created subtask
    pub fn add_subtask(&mut self) {
        debug!(week = self.index, "adding blank subtask entry");
        self.time_tracked.push(0.0);
    }

    /// Total time tracked in this slot
    pub fn total_time(&self) -> f64 {
        self.time_tracked.iter().sum()
    }

    /// Time in a single entry, 0 for entries this slot predates
    pub fn time_in_entry(&self, position: usize) -> f64 {
        self.time_tracked.get(position).copied().unwrap_or(0.0)
    }

    /// Overwrite stored values positionally, starting at index 0.
    ///
    /// Stored entries past the end of `values` keep their value. More values
    /// than stored entries, or any non-finite value, is rejected and nothing
    /// is written.
    pub fn update_values(&mut self, values: &[f64]) -> Result<(), TrackerError> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            error!(week = self.index, value = %bad, "refusing non-finite time value");
            return validate_value(*bad);
        }
        if values.len() > self.time_tracked.len() {
            error!(
                week = self.index,
                expected = self.time_tracked.len(),
                actual = values.len(),
                "too many values provided for week slot"
            );
            return Err(TrackerError::SizeMismatch {
                week: self.index,
                expected: self.time_tracked.len(),
                actual: values.len(),
            });
        }

        self.time_tracked[..values.len()].copy_from_slice(values);
        Ok(())
    }
}

/// Convert raw text from an input field into a time value.
/// Blank or unparsable text counts as 0.
pub fn parse_entry(text: &str) -> f64 {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}
