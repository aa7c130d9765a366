use super::error::{validate_name, TrackerError};
use super::task::Task;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, warn};

/// All tracked tasks plus the global week timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    /// Display order; holds every key of `tasks` exactly once
    task_order: Vec<String>,
    tasks: BTreeMap<String, Task>,
    /// Start date of week 0
    pub first_date: NaiveDate,
    /// Weeks below this index are hidden from display
    archived_week_index: usize,
    /// Number of global weeks created so far
    week_count: usize,
}

impl Tracker {
    /// An empty tracker whose week 0 starts on `first_date`
    pub fn new(first_date: NaiveDate) -> Self {
        Self {
            task_order: Vec::new(),
            tasks: BTreeMap::new(),
            first_date,
            archived_week_index: 0,
            week_count: 0,
        }
    }

    /// Assemble a tracker from already-validated parts (used by the store)
    pub(crate) fn from_parts(
        first_date: NaiveDate,
        tasks: Vec<Task>,
        archived_week_index: usize,
        week_count: usize,
    ) -> Self {
        let task_order = tasks.iter().map(|t| t.name.clone()).collect();
        let tasks = tasks.into_iter().map(|t| (t.name.clone(), t)).collect();
        Self {
            task_order,
            tasks,
            first_date,
            archived_week_index,
            week_count,
        }
    }

    pub fn task_order(&self) -> &[String] {
        &self.task_order
    }

    pub fn archived_week_index(&self) -> usize {
        self.archived_week_index
    }

    pub fn week_count(&self) -> usize {
        self.week_count
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    fn task_mut(&mut self, name: &str) -> Result<&mut Task, TrackerError> {
        self.tasks
            .get_mut(name)
            .ok_or_else(|| TrackerError::TaskNotFound(name.to_string()))
    }

    /// All tasks in display order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.task_order.iter().filter_map(|name| self.tasks.get(name))
    }

    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks().filter(|t| !t.archived)
    }

    pub fn archived_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks().filter(|t| t.archived)
    }

    pub fn check_task_name_validity(&self, name: &str) -> Result<(), TrackerError> {
        validate_name(name)?;
        if self.tasks.contains_key(name) {
            warn!(task = name, "task name already exists");
            return Err(TrackerError::DuplicateTask(name.to_string()));
        }
        Ok(())
    }

    /// Create a task with a blank slot for the most recent week
    pub fn create_task(&mut self, name: &str) -> Result<(), TrackerError> {
        self.check_task_name_validity(name)?;
        if self.week_count == 0 {
            warn!(task = name, "no weeks exist yet, aborting task creation");
            return Err(TrackerError::NoWeeks);
        }

        let task = Task::new(name, self.week_count - 1);
        self.task_order.push(name.to_string());
        self.tasks.insert(name.to_string(), task);
        Ok(())
    }

    /// Rename a task, keeping its place in the display order
    pub fn rename_task(&mut self, old: &str, new: &str) -> Result<(), TrackerError> {
        if !self.tasks.contains_key(old) {
            return Err(TrackerError::TaskNotFound(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        self.check_task_name_validity(new)?;

        let mut task = self
            .tasks
            .remove(old)
            .ok_or_else(|| TrackerError::TaskNotFound(old.to_string()))?;
        task.rename_task(new)?;
        self.tasks.insert(new.to_string(), task);
        if let Some(entry) = self.task_order.iter_mut().find(|n| *n == old) {
            *entry = new.to_string();
        }
        Ok(())
    }

    pub fn add_subtask(&mut self, task: &str, name: &str) -> Result<(), TrackerError> {
        self.task_mut(task)?.add_subtask(name)
    }

    pub fn rename_subtask(&mut self, task: &str, old: &str, new: &str) -> Result<(), TrackerError> {
        self.task_mut(task)?.rename_subtask(old, new)
    }

    pub fn set_subtask_estimate(
        &mut self,
        task: &str,
        subtask: &str,
        estimate: f64,
    ) -> Result<(), TrackerError> {
        self.task_mut(task)?.set_subtask_estimate(subtask, estimate)
    }

    pub fn archive_task(&mut self, name: &str) -> Result<(), TrackerError> {
        self.task_mut(name)?.archive();
        Ok(())
    }

    pub fn unarchive_task(&mut self, name: &str) -> Result<(), TrackerError> {
        self.task_mut(name)?.unarchive();
        Ok(())
    }

    pub fn update_week_values(
        &mut self,
        task: &str,
        week_index: usize,
        values: &[f64],
    ) -> Result<(), TrackerError> {
        self.task_mut(task)?.update_week_values(week_index, values)
    }

    /// Start a new global week and give every non-archived task a slot for it.
    /// Returns the new week's index.
    pub fn add_week(&mut self) -> usize {
        let week_index = self.week_count;
        debug!(week = week_index, "adding week globally");
        for task in self.tasks.values_mut() {
            task.add_week(week_index);
        }
        self.week_count += 1;
        week_index
    }

    /// Time tracked in one week across all tasks
    pub fn get_time_for_week(&self, week_index: usize) -> f64 {
        self.tasks.values().map(|t| t.get_time_for_week(week_index)).sum()
    }

    pub fn get_total_time_spent(&self) -> f64 {
        self.tasks.values().map(Task::get_total_time_spent).sum()
    }

    pub fn set_archived_week_index(&mut self, index: usize) -> Result<(), TrackerError> {
        if index > self.week_count {
            return Err(TrackerError::ArchiveIndexOutOfRange {
                index,
                week_count: self.week_count,
            });
        }
        self.archived_week_index = index;
        Ok(())
    }

    /// Hide one more week from the front. No-op once every week is hidden.
    pub fn hide_oldest_week(&mut self) -> bool {
        if self.archived_week_index >= self.week_count {
            return false;
        }
        self.archived_week_index += 1;
        true
    }

    /// Show one more week at the front. No-op when nothing is hidden.
    pub fn show_previous_week(&mut self) -> bool {
        if self.archived_week_index == 0 {
            return false;
        }
        self.archived_week_index -= 1;
        true
    }

    /// Weeks that are not hidden by the archive cutoff
    pub fn visible_weeks(&self) -> Range<usize> {
        self.archived_week_index..self.week_count
    }

    /// Start date of a week, `None` past the end of the calendar
    pub fn week_start(&self, week_index: usize) -> Option<NaiveDate> {
        let days = u64::try_from(week_index).ok()?.checked_mul(7)?;
        self.first_date.checked_add_days(Days::new(days))
    }

    /// Short label for a week column, like "14 Sep"
    pub fn week_label(&self, week_index: usize) -> String {
        match self.week_start(week_index) {
            Some(start) => start.format("%d %b").to_string(),
            None => format!("week {}", week_index),
        }
    }
}
