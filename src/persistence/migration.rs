use super::schema::{
    StoredDocument, StoredSubtask, StoredTask, StoredTasks, StoredWeek, CURRENT_VERSION,
};
use super::store::StoreError;
use crate::domain::{Subtask, Task, Tracker, WeekSlot};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Week indices past this (about a thousand years of weeks) are treated as corrupt
pub const MAX_WEEK_INDEX: usize = 52_000;

const LEGACY_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse the stored first date, accepting the legacy date-time forms
pub fn parse_first_date(raw: &str) -> Result<NaiveDate, StoreError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    LEGACY_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| StoreError::InvalidDate(raw.to_string()))
}

/// Turn a stored document of any known version into a tracker.
///
/// Missing fields get defaults and inconsistencies are repaired; every repair
/// is logged. Only an unknown version or an unreadable date fails.
pub fn migrate(doc: StoredDocument, today: NaiveDate) -> Result<Tracker, StoreError> {
    if doc.version > CURRENT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: doc.version,
            supported: CURRENT_VERSION,
        });
    }
    if doc.version < CURRENT_VERSION {
        debug!(version = doc.version, "migrating legacy tracker document");
    }

    let first_date = match doc.first_date.as_deref() {
        Some(raw) => parse_first_date(raw)?,
        None => {
            warn!("document has no first_date, using today");
            today
        }
    };

    let named = name_tasks(doc.tasks, &doc.task_order);
    let order = reconcile_order(&doc.task_order, &named);

    let mut by_name: BTreeMap<String, StoredTask> = named.into_iter().collect();
    let tasks: Vec<Task> = order
        .into_iter()
        .filter_map(|name| by_name.remove(&name).map(|stored| migrate_task(name, stored)))
        .collect();

    let derived_week_count = tasks
        .iter()
        .filter_map(Task::last_week_index)
        .map(|last| last + 1)
        .max()
        .unwrap_or(0);
    let stored_week_count = doc.week_count.unwrap_or(0);
    if stored_week_count > MAX_WEEK_INDEX + 1 {
        warn!(stored = stored_week_count, "week_count out of range, ignoring it");
    }
    let week_count = stored_week_count
        .min(MAX_WEEK_INDEX + 1)
        .max(derived_week_count);

    let raw_archived = doc.archived_week_index.unwrap_or(0);
    let archived_week_index = raw_archived.clamp(0, week_count as i64) as usize;
    if archived_week_index as i64 != raw_archived {
        warn!(
            stored = raw_archived,
            clamped = archived_week_index,
            "archived_week_index out of range"
        );
    }

    Ok(Tracker::from_parts(
        first_date,
        tasks,
        archived_week_index,
        week_count,
    ))
}

/// Pair each stored task with its name.
///
/// Map keys are authoritative. Legacy lists use `task_name` when present and
/// otherwise the name at the same position in `task_order`.
fn name_tasks(tasks: StoredTasks, task_order: &[String]) -> Vec<(String, StoredTask)> {
    let candidates: Vec<(Option<String>, StoredTask)> = match tasks {
        StoredTasks::Map(map) => map
            .into_iter()
            .map(|(key, task)| {
                if task.task_name.as_deref().is_some_and(|n| n != key) {
                    warn!(key = %key, "task_name differs from its key, using the key");
                }
                (Some(key), task)
            })
            .collect(),
        StoredTasks::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(i, task)| {
                let name = task.task_name.clone().or_else(|| task_order.get(i).cloned());
                (name, task)
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut named = Vec::with_capacity(candidates.len());
    for (i, (name, task)) in candidates.into_iter().enumerate() {
        let base = match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                warn!(position = i, "task has no name");
                format!("Task {}", i + 1)
            }
        };
        let name = unique_name(&base, &seen);
        if name != base {
            warn!(task = %base, renamed = %name, "duplicate task name");
        }
        seen.insert(name.clone());
        named.push((name, task));
    }
    named
}

/// Keep `task_order` entries that name a task (first occurrence only), then
/// append tasks the order forgot.
fn reconcile_order(task_order: &[String], named: &[(String, StoredTask)]) -> Vec<String> {
    let known: HashSet<&str> = named.iter().map(|(name, _)| name.as_str()).collect();
    let mut placed = HashSet::new();
    let mut order = Vec::with_capacity(named.len());

    for name in task_order {
        if !known.contains(name.as_str()) {
            warn!(task = %name, "task_order names a missing task, dropping it");
            continue;
        }
        if !placed.insert(name.clone()) {
            warn!(task = %name, "task listed twice in task_order");
            continue;
        }
        order.push(name.clone());
    }

    for (name, _) in named {
        if placed.insert(name.clone()) {
            warn!(task = %name, "task missing from task_order, appending it");
            order.push(name.clone());
        }
    }
    order
}

fn migrate_task(name: String, stored: StoredTask) -> Task {
    if let Some(estimate) = stored.estimate.filter(|e| *e != 0.0) {
        warn!(task = %name, estimate, "dropping task-level estimate, estimates live on subtasks");
    }

    let mut seen = HashSet::new();
    let subtasks: Vec<Subtask> = stored
        .subtasks
        .into_iter()
        .map(|st| {
            let (base, estimate) = match st {
                StoredSubtask::Name(subtask) => (subtask, 0.0),
                StoredSubtask::Record {
                    name: subtask,
                    estimate,
                } => (subtask, estimate),
            };
            let subtask_name = unique_name(&base, &seen);
            if subtask_name != base {
                warn!(task = %name, subtask = %base, renamed = %subtask_name, "duplicate subtask name");
            }
            seen.insert(subtask_name.clone());
            Subtask {
                name: subtask_name,
                estimate,
            }
        })
        .collect();

    let first_week_id = stored.first_week_id;
    let mut weeks: Vec<WeekSlot> = stored
        .weeks
        .into_iter()
        .enumerate()
        .filter_map(|(position, week)| {
            let (index, values) = match week {
                StoredWeek::Values(values) => (first_week_id.checked_add(position), values),
                StoredWeek::Record {
                    index,
                    time_tracked,
                } => (Some(index), time_tracked),
            };
            match index {
                Some(index) if index <= MAX_WEEK_INDEX => Some(WeekSlot::new(index, values)),
                _ => {
                    warn!(task = %name, position, "week index out of range, dropping the slot");
                    None
                }
            }
        })
        .collect();

    let unsorted = weeks.windows(2).any(|pair| pair[0].index >= pair[1].index);
    if unsorted {
        warn!(task = %name, "week slots out of order, sorting them");
        weeks.sort_by_key(|w| w.index);
        let before = weeks.len();
        weeks.dedup_by_key(|w| w.index);
        if weeks.len() != before {
            warn!(task = %name, dropped = before - weeks.len(), "dropped duplicate week slots");
        }
    }

    for week in &weeks {
        if week.time_tracked.len() > subtasks.len() {
            warn!(
                task = %name,
                week = week.index,
                values = week.time_tracked.len(),
                subtasks = subtasks.len(),
                "week slot has more values than the task has subtasks"
            );
        }
    }

    let first_week_id = weeks
        .first()
        .map(|w| w.index)
        .unwrap_or(first_week_id.min(MAX_WEEK_INDEX));

    Task {
        name,
        first_week_id,
        subtasks,
        weeks,
        archived: stored.archived,
    }
}

/// `base`, or `base (n)` for the first n that is not taken
fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Current-version document for a tracker
pub fn to_document(tracker: &Tracker) -> StoredDocument {
    let tasks = tracker
        .tasks()
        .map(|task| {
            let stored = StoredTask {
                task_name: Some(task.name.clone()),
                first_week_id: task.first_week_id,
                subtasks: task
                    .subtasks
                    .iter()
                    .map(|st| StoredSubtask::Record {
                        name: st.name.clone(),
                        estimate: st.estimate,
                    })
                    .collect(),
                weeks: task
                    .weeks
                    .iter()
                    .map(|w| StoredWeek::Record {
                        index: w.index,
                        time_tracked: w.time_tracked.clone(),
                    })
                    .collect(),
                archived: task.archived,
                estimate: None,
            };
            (task.name.clone(), stored)
        })
        .collect();

    StoredDocument {
        version: CURRENT_VERSION,
        task_order: tracker.task_order().to_vec(),
        tasks: StoredTasks::Map(tasks),
        first_date: Some(tracker.first_date.format(DATE_FORMAT).to_string()),
        archived_week_index: Some(tracker.archived_week_index() as i64),
        week_count: Some(tracker.week_count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn parse(json: &str) -> Result<Tracker, StoreError> {
        migrate(serde_json::from_str(json).unwrap(), today())
    }

    #[test]
    fn test_parse_first_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap();
        assert_eq!(parse_first_date("2016-01-04").unwrap(), expected);
        assert_eq!(parse_first_date("2016-01-04 00:00:00").unwrap(), expected);
        assert_eq!(parse_first_date("2016-01-04 10:30:00.250").unwrap(), expected);
        assert!(matches!(
            parse_first_date("last tuesday"),
            Err(StoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_empty_document_defaults() {
        let tracker = parse("{}").unwrap();
        assert_eq!(tracker, Tracker::new(today()));
    }

    #[test]
    fn test_legacy_document() {
        let tracker = parse(
            r#"{
                "task_order": ["Writing", "Reading"],
                "tasks": [
                    {"first_week_id": 1, "subtasks": ["Draft", "Edit"], "weeks": [[2, 1], [0.5]], "archived": false},
                    {"first_week_id": 0, "subtasks": [], "weeks": [[], [], []], "archived": true, "estimate": 3}
                ],
                "first_date": "2016-01-04 00:00:00",
                "archived_week_index": 1
            }"#,
        )
        .unwrap();

        assert_eq!(tracker.task_order(), &["Writing", "Reading"].map(String::from));
        assert_eq!(tracker.first_date, NaiveDate::from_ymd_opt(2016, 1, 4).unwrap());
        assert_eq!(tracker.week_count(), 3);
        assert_eq!(tracker.archived_week_index(), 1);

        let writing = tracker.task("Writing").unwrap();
        assert_eq!(writing.first_week_id, 1);
        assert_eq!(writing.weeks[1], WeekSlot::new(2, vec![0.5]));
        assert_eq!(writing.subtasks[0].estimate, 0.0);
        assert_eq!(writing.get_time_for_subtask("Edit"), 1.0);
        assert_eq!(writing.get_total_time_spent(), 3.5);

        let reading = tracker.task("Reading").unwrap();
        assert!(reading.archived);
        assert_eq!(reading.estimate(), 0.0);
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(
            parse(r#"{"version": 99}"#),
            Err(StoreError::UnsupportedVersion {
                found: 99,
                supported: CURRENT_VERSION
            })
        ));
    }

    #[test]
    fn test_order_repairs() {
        let tracker = parse(
            r#"{
                "version": 2,
                "task_order": ["B", "Ghost", "B"],
                "tasks": {"A": {"weeks": [{"index": 0}]}, "B": {"weeks": [{"index": 0}]}},
                "first_date": "2024-01-01"
            }"#,
        )
        .unwrap();
        assert_eq!(tracker.task_order(), &["B", "A"].map(String::from));
    }

    #[test]
    fn test_duplicate_subtask_names_suffixed() {
        let tracker = parse(
            r#"{"tasks": {"A": {"subtasks": ["x", "x", {"name": "x", "estimate": 2}]}}}"#,
        )
        .unwrap();
        let names: Vec<&str> = tracker.task("A").unwrap().subtasks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["x", "x (2)", "x (3)"]);
    }

    #[test]
    fn test_unnamed_legacy_task() {
        let tracker = parse(r#"{"tasks": [{"weeks": [[1]]}]}"#).unwrap();
        assert_eq!(tracker.task_order(), &["Task 1".to_string()]);
    }

    #[test]
    fn test_weeks_sorted_and_deduplicated() {
        let tracker = parse(
            r#"{"tasks": {"A": {"subtasks": ["s"], "weeks": [
                {"index": 4, "time_tracked": [1]},
                {"index": 2, "time_tracked": [2]},
                {"index": 4, "time_tracked": [3]}
            ]}}}"#,
        )
        .unwrap();
        let task = tracker.task("A").unwrap();
        let indices: Vec<usize> = task.weeks.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![2, 4]);
        assert_eq!(task.first_week_id, 2);
        assert_eq!(tracker.week_count(), 5);
    }

    #[test]
    fn test_archived_week_index_clamped() {
        let high = parse(r#"{"archived_week_index": 10, "week_count": 3}"#).unwrap();
        assert_eq!(high.archived_week_index(), 3);

        let low = parse(r#"{"archived_week_index": -2}"#).unwrap();
        assert_eq!(low.archived_week_index(), 0);
    }

    #[test]
    fn test_stored_week_count_kept_when_larger() {
        let tracker = parse(r#"{"week_count": 6, "tasks": {"A": {"weeks": [[0]]}}}"#).unwrap();
        assert_eq!(tracker.week_count(), 6);
    }

    #[test]
    fn test_huge_week_index_dropped() {
        let tracker = parse(
            r#"{"tasks": {"A": {"subtasks": ["s"], "weeks": [
                {"index": 1, "time_tracked": [2]},
                {"index": 18446744073709551615, "time_tracked": [1]}
            ]}}}"#,
        )
        .unwrap();
        let task = tracker.task("A").unwrap();
        assert_eq!(task.weeks, vec![WeekSlot::new(1, vec![2.0])]);
        assert_eq!(tracker.week_count(), 2);
    }

    #[test]
    fn test_legacy_first_week_id_overflow() {
        let tracker = parse(
            r#"{"tasks": [{"task_name": "A", "first_week_id": 18446744073709551615, "weeks": [[1], [2]]}]}"#,
        )
        .unwrap();
        let task = tracker.task("A").unwrap();
        assert!(task.weeks.is_empty());
        assert_eq!(task.first_week_id, MAX_WEEK_INDEX);
        assert_eq!(tracker.week_count(), 0);
    }

    #[test]
    fn test_week_count_capped() {
        let tracker = parse(r#"{"week_count": 18446744073709551615, "archived_week_index": 5}"#).unwrap();
        assert_eq!(tracker.week_count(), MAX_WEEK_INDEX + 1);
        assert_eq!(tracker.archived_week_index(), 5);
        assert!(tracker.week_start(MAX_WEEK_INDEX).is_some());
    }

    #[test]
    fn test_to_document_then_migrate() {
        let mut tracker = Tracker::new(today());
        tracker.add_week();
        tracker.create_task("Writing").unwrap();
        tracker.add_subtask("Writing", "Draft").unwrap();
        tracker.update_week_values("Writing", 0, &[1.25]).unwrap();
        tracker.add_week();

        let doc = to_document(&tracker);
        assert_eq!(doc.version, CURRENT_VERSION);
        assert_eq!(doc.first_date.as_deref(), Some("2026-10-19"));
        assert_eq!(migrate(doc, today()).unwrap(), tracker);
    }
}
