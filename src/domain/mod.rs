pub mod error;
pub mod task;
pub mod tracker;
pub mod views;
pub mod week_slot;

pub use error::TrackerError;
pub use task::{Subtask, Task};
pub use tracker::Tracker;
pub use views::{compute_totals, task_rows, week_columns, SubtaskRow, TaskRow, WeekColumn};
pub use week_slot::{parse_entry, WeekSlot};
