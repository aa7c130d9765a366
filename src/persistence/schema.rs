//! On-disk shape of the tracker document.
//!
//! Version 1 documents (written before the version field existed) store
//! subtasks as bare names, weeks as bare value lists, the first date with a
//! time component, and sometimes the task list as an array. Version 2 stores
//! explicit records. Both shapes deserialize into the same structs; turning
//! them into a [`Tracker`](crate::domain::Tracker) happens in `migration`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Newest schema version this build reads and the one it writes
pub const CURRENT_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    1
}

/// Top-level document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub task_order: Vec<String>,
    #[serde(default)]
    pub tasks: StoredTasks,
    #[serde(default)]
    pub first_date: Option<String>,
    #[serde(default)]
    pub archived_week_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_count: Option<usize>,
}

/// Tasks keyed by name, or (legacy) a list in `task_order` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTasks {
    Map(BTreeMap<String, StoredTask>),
    List(Vec<StoredTask>),
}

impl Default for StoredTasks {
    fn default() -> Self {
        StoredTasks::Map(BTreeMap::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default)]
    pub first_week_id: usize,
    #[serde(default)]
    pub subtasks: Vec<StoredSubtask>,
    #[serde(default)]
    pub weeks: Vec<StoredWeek>,
    #[serde(default)]
    pub archived: bool,
    /// Task-level estimate from before estimates moved to subtasks
    #[serde(default, skip_serializing)]
    pub estimate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSubtask {
    Name(String),
    Record {
        name: String,
        #[serde(default)]
        estimate: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredWeek {
    /// Legacy: index is `first_week_id` plus the position in `weeks`
    Values(Vec<f64>),
    Record {
        index: usize,
        #[serde(default)]
        time_tracked: Vec<f64>,
    },
}
