use super::error::{validate_name, validate_value, TrackerError};
use super::week_slot::WeekSlot;
use tracing::{debug, warn};

/// A named subdivision of a task with its own planned time
#[derive(Debug, Clone, PartialEq)]
pub struct Subtask {
    pub name: String,
    pub estimate: f64,
}

impl Subtask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            estimate: 0.0,
        }
    }
}

/// A tracked task: subtasks plus one week slot per week it was active
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique task name (the key in the tracker)
    pub name: String,
    /// Earliest week this task has data for
    pub first_week_id: usize,
    /// Subtasks in display order; week slot entries follow this order
    pub subtasks: Vec<Subtask>,
    /// Week slots in strictly increasing `index` order
    pub weeks: Vec<WeekSlot>,
    /// Hidden from active lists and frozen from receiving new weeks
    pub archived: bool,
}

impl Task {
    /// Create a task with one blank slot for `week_index`
    pub fn new(name: impl Into<String>, week_index: usize) -> Self {
        let name = name.into();
        debug!(task = %name, week = week_index, "creating task");
        Self {
            name,
            first_week_id: week_index,
            subtasks: Vec::new(),
            weeks: vec![WeekSlot::zeroed(week_index, 0)],
            archived: false,
        }
    }

    /// Planned time for the whole task: the sum of subtask estimates
    pub fn estimate(&self) -> f64 {
        self.subtasks.iter().map(|st| st.estimate).sum()
    }

    /// Estimate minus time spent. Negative once the task overruns.
    pub fn remaining(&self) -> f64 {
        self.estimate() - self.get_total_time_spent()
    }

    pub fn get_total_time_spent(&self) -> f64 {
        self.weeks.iter().map(WeekSlot::total_time).sum()
    }

    /// Time tracked against one subtask across all weeks.
    /// Unknown subtasks have no time.
    pub fn get_time_for_subtask(&self, subtask: &str) -> f64 {
        match self.subtask_position(subtask) {
            Some(position) => self
                .weeks
                .iter()
                .map(|week| week.time_in_entry(position))
                .sum(),
            None => 0.0,
        }
    }

    /// Total for the given global week, 0 when this task has no slot for it
    pub fn get_time_for_week(&self, week_index: usize) -> f64 {
        self.week(week_index).map(WeekSlot::total_time).unwrap_or(0.0)
    }

    pub fn week(&self, week_index: usize) -> Option<&WeekSlot> {
        self.weeks
            .binary_search_by_key(&week_index, |w| w.index)
            .ok()
            .map(|i| &self.weeks[i])
    }

    pub fn week_mut(&mut self, week_index: usize) -> Option<&mut WeekSlot> {
        match self.weeks.binary_search_by_key(&week_index, |w| w.index) {
            Ok(i) => Some(&mut self.weeks[i]),
            Err(_) => None,
        }
    }

    /// Index of the most recent week slot
    pub fn last_week_index(&self) -> Option<usize> {
        self.weeks.last().map(|w| w.index)
    }

    pub fn subtask_position(&self, name: &str) -> Option<usize> {
        self.subtasks.iter().position(|st| st.name == name)
    }

    pub fn has_subtask(&self, name: &str) -> bool {
        self.subtask_position(name).is_some()
    }

    /// Add a subtask. Only the most recent week slot gains an entry for it.
    pub fn add_subtask(&mut self, name: &str) -> Result<(), TrackerError> {
        validate_name(name)?;
        if self.has_subtask(name) {
            warn!(task = %self.name, subtask = name, "subtask name already exists");
            return Err(TrackerError::DuplicateSubtask {
                task: self.name.clone(),
                subtask: name.to_string(),
            });
        }

        debug!(task = %self.name, subtask = name, "adding subtask");
        self.subtasks.push(Subtask::new(name));
        if let Some(latest) = self.weeks.last_mut() {
            latest.add_subtask();
        }
        Ok(())
    }

    /// Rename a subtask in place, keeping its position
    pub fn rename_subtask(&mut self, old: &str, new: &str) -> Result<(), TrackerError> {
        validate_name(new)?;
        let position = self.subtask_position(old).ok_or_else(|| TrackerError::SubtaskNotFound {
            task: self.name.clone(),
            subtask: old.to_string(),
        })?;
        if old == new {
            return Ok(());
        }
        if self.has_subtask(new) {
            warn!(task = %self.name, subtask = new, "subtask name already exists");
            return Err(TrackerError::DuplicateSubtask {
                task: self.name.clone(),
                subtask: new.to_string(),
            });
        }

        debug!(task = %self.name, from = old, to = new, "renaming subtask");
        self.subtasks[position].name = new.to_string();
        Ok(())
    }

    /// Rename this task. Uniqueness across tasks is checked by the tracker.
    pub fn rename_task(&mut self, new_name: &str) -> Result<(), TrackerError> {
        validate_name(new_name)?;
        debug!(from = %self.name, to = new_name, "renaming task");
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn set_subtask_estimate(&mut self, subtask: &str, estimate: f64) -> Result<(), TrackerError> {
        validate_value(estimate)?;
        let position = self.subtask_position(subtask).ok_or_else(|| TrackerError::SubtaskNotFound {
            task: self.name.clone(),
            subtask: subtask.to_string(),
        })?;
        self.subtasks[position].estimate = estimate;
        Ok(())
    }

    /// Append a blank slot for `week_index`.
    ///
    /// Archived tasks are skipped, as is a week this task already has a slot
    /// for. Returns whether a slot was added.
    pub fn add_week(&mut self, week_index: usize) -> bool {
        if self.archived {
            debug!(task = %self.name, week = week_index, "skipping week for archived task");
            return false;
        }
        if self.last_week_index().is_some_and(|last| last >= week_index) {
            warn!(task = %self.name, week = week_index, "task already has a slot for this week");
            return false;
        }

        debug!(task = %self.name, week = week_index, "adding week");
        if self.weeks.is_empty() {
            self.first_week_id = week_index;
        }
        self.weeks.push(WeekSlot::zeroed(week_index, self.subtasks.len()));
        true
    }

    /// Overwrite the values of one week, see [`WeekSlot::update_values`]
    pub fn update_week_values(&mut self, week_index: usize, values: &[f64]) -> Result<(), TrackerError> {
        let task = self.name.clone();
        let slot = self.week_mut(week_index).ok_or(TrackerError::WeekNotFound {
            task,
            week: week_index,
        })?;
        slot.update_values(values)
    }

    pub fn archive(&mut self) {
        debug!(task = %self.name, "archiving task");
        self.archived = true;
    }

    /// Show the task again. Weeks added while archived are not back-filled.
    pub fn unarchive(&mut self) {
        debug!(task = %self.name, "unarchiving task");
        self.archived = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn writing_task() -> Task {
        let mut task = Task::new("Writing", 3);
        task.add_subtask("Draft").unwrap();
        task.add_subtask("Edit").unwrap();
        task.update_week_values(3, &[2.0, 1.0]).unwrap();
        task
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("Reading", 5);
        assert_eq!(task.first_week_id, 5);
        assert_eq!(task.weeks, vec![WeekSlot::zeroed(5, 0)]);
        assert!(task.subtasks.is_empty());
        assert!(!task.archived);
    }

    #[test]
    fn test_writing_example() {
        let task = writing_task();
        assert_eq!(task.get_total_time_spent(), 3.0);
        assert_eq!(task.get_time_for_subtask("Draft"), 2.0);
        assert_eq!(task.get_time_for_subtask("Edit"), 1.0);
        assert_eq!(task.get_time_for_week(3), 3.0);
        assert_eq!(task.get_time_for_week(0), 0.0);
        assert_eq!(task.get_time_for_week(4), 0.0);
    }

    #[test]
    fn test_get_time_for_week_is_idempotent() {
        let task = writing_task();
        assert_eq!(task.get_time_for_week(3), task.get_time_for_week(3));
    }

    #[test]
    fn test_add_subtask_extends_only_latest_week() {
        let mut task = writing_task();
        task.add_week(4);
        task.add_week(5);
        task.add_subtask("Publish").unwrap();

        let lengths: Vec<usize> = task.weeks.iter().map(|w| w.time_tracked.len()).collect();
        assert_eq!(lengths, vec![2, 2, 3]);
    }

    #[test]
    fn test_time_for_subtask_counts_short_weeks_as_zero() {
        let mut task = writing_task();
        task.add_week(4);
        task.add_subtask("Publish").unwrap();
        task.update_week_values(4, &[1.0, 0.0, 4.0]).unwrap();

        assert_eq!(task.get_time_for_subtask("Publish"), 4.0);
        assert_eq!(task.get_time_for_subtask("Draft"), 3.0);
        assert_eq!(task.get_time_for_subtask("Missing"), 0.0);
        assert_eq!(task.get_total_time_spent(), 8.0);
    }

    #[test]
    fn test_add_subtask_duplicate_rejected() {
        let mut task = writing_task();
        let before = task.clone();
        let err = task.add_subtask("Draft").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(task, before);
    }

    #[test]
    fn test_add_subtask_empty_name_rejected() {
        let mut task = Task::new("Writing", 0);
        assert_eq!(task.add_subtask("  "), Err(TrackerError::EmptyName));
    }

    #[test]
    fn test_rename_subtask() {
        let mut task = writing_task();
        task.rename_subtask("Draft", "Outline").unwrap();
        let names: Vec<&str> = task.subtasks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Outline", "Edit"]);
        assert_eq!(task.get_time_for_subtask("Outline"), 2.0);
    }

    #[test]
    fn test_rename_subtask_collision_rejected() {
        let mut task = writing_task();
        let before = task.clone();
        assert!(matches!(
            task.rename_subtask("Draft", "Edit"),
            Err(TrackerError::DuplicateSubtask { .. })
        ));
        assert_eq!(task, before);
    }

    #[test]
    fn test_rename_subtask_missing() {
        let mut task = writing_task();
        assert!(matches!(
            task.rename_subtask("Nope", "Other"),
            Err(TrackerError::SubtaskNotFound { .. })
        ));
    }

    #[test]
    fn test_estimate_and_remaining() {
        let mut task = writing_task();
        task.set_subtask_estimate("Draft", 4.0).unwrap();
        task.set_subtask_estimate("Edit", 1.5).unwrap();
        assert_eq!(task.estimate(), 5.5);
        assert_eq!(task.remaining(), 2.5);
    }

    #[test]
    fn test_non_finite_estimate_rejected() {
        let mut task = writing_task();
        task.set_subtask_estimate("Draft", 2.0).unwrap();
        assert!(matches!(
            task.set_subtask_estimate("Draft", f64::NAN),
            Err(TrackerError::NonFiniteValue(_))
        ));
        assert_eq!(
            task.set_subtask_estimate("Edit", f64::INFINITY),
            Err(TrackerError::NonFiniteValue(f64::INFINITY))
        );
        assert_eq!(task.estimate(), 2.0);
    }

    #[test]
    fn test_add_week_skipped_when_archived() {
        let mut task = writing_task();
        task.archive();
        assert!(!task.add_week(4));
        assert_eq!(task.weeks.len(), 1);

        task.unarchive();
        assert!(task.add_week(5));
        let indices: Vec<usize> = task.weeks.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![3, 5]);
        assert_eq!(task.get_time_for_week(4), 0.0);
    }

    #[test]
    fn test_add_week_sized_to_subtasks() {
        let mut task = writing_task();
        task.add_week(4);
        assert_eq!(task.week(4).unwrap().time_tracked, vec![0.0, 0.0]);
    }

    #[test]
    fn test_add_week_existing_index_ignored() {
        let mut task = writing_task();
        assert!(!task.add_week(3));
        assert_eq!(task.weeks.len(), 1);
    }

    #[test]
    fn test_update_week_values_missing_week() {
        let mut task = writing_task();
        assert_eq!(
            task.update_week_values(7, &[1.0]),
            Err(TrackerError::WeekNotFound {
                task: "Writing".to_string(),
                week: 7
            })
        );
    }
}
