use super::task::Task;
use super::tracker::Tracker;

/// Spent / estimate / remaining figures for one subtask
#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskRow {
    pub name: String,
    pub spent: f64,
    pub estimate: f64,
    pub remaining: f64,
}

/// A task as shown in the main grid
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub name: String,
    pub spent: f64,
    pub estimate: f64,
    pub remaining: f64,
    pub subtasks: Vec<SubtaskRow>,
    /// Week index and total, for visible weeks this task has a slot in
    pub weeks: Vec<(usize, f64)>,
}

/// Header of a week column
#[derive(Debug, Clone, PartialEq)]
pub struct WeekColumn {
    pub index: usize,
    pub label: String,
    pub total: f64,
}

fn task_row(task: &Task, tracker: &Tracker) -> TaskRow {
    let spent = task.get_total_time_spent();
    let estimate = task.estimate();

    let subtasks = task
        .subtasks
        .iter()
        .map(|st| {
            let spent = task.get_time_for_subtask(&st.name);
            SubtaskRow {
                name: st.name.clone(),
                spent,
                estimate: st.estimate,
                remaining: st.estimate - spent,
            }
        })
        .collect();

    let visible = tracker.visible_weeks();
    let weeks = task
        .weeks
        .iter()
        .filter(|w| visible.contains(&w.index))
        .map(|w| (w.index, w.total_time()))
        .collect();

    TaskRow {
        name: task.name.clone(),
        spent,
        estimate,
        remaining: estimate - spent,
        subtasks,
        weeks,
    }
}

/// Rows for every non-archived task, in display order
pub fn task_rows(tracker: &Tracker) -> Vec<TaskRow> {
    tracker.active_tasks().map(|t| task_row(t, tracker)).collect()
}

/// Column headers for the weeks not hidden by the archive cutoff
pub fn week_columns(tracker: &Tracker) -> Vec<WeekColumn> {
    tracker
        .visible_weeks()
        .map(|index| WeekColumn {
            index,
            label: tracker.week_label(index),
            total: tracker.get_time_for_week(index),
        })
        .collect()
}

/// Total spent and estimated time over active tasks
pub fn compute_totals(tracker: &Tracker) -> (f64, f64) {
    tracker.active_tasks().fold((0.0, 0.0), |(spent, estimate), task| {
        (spent + task.get_total_time_spent(), estimate + task.estimate())
    })
}
