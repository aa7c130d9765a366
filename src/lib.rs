//! Weekly time tracking: tasks split into subtasks, with time logged per
//! calendar week and kept in a single JSON document.

pub mod domain;
pub mod logging;
pub mod persistence;
pub mod report;

pub use domain::{parse_entry, Subtask, Task, Tracker, TrackerError, WeekSlot};
pub use persistence::{load_tracker, save_tracker, StoreError};
