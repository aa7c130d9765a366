use crate::domain::Tracker;

/// Statistics across the whole tracker
#[derive(Debug, PartialEq)]
pub struct TrackerStats {
    pub total_tasks: usize,
    pub active_count: usize,
    pub archived_count: usize,
    pub total_spent: f64,
    pub total_estimate: f64,
    pub week_count: usize,
    pub average_per_week: f64,
    /// Week with the most time tracked, if any time was tracked at all
    pub busiest_week: Option<(usize, f64)>,
}

/// Estimate vs. actual for tasks that have an estimate
#[derive(Debug, PartialEq)]
pub struct EstimationStats {
    pub over_estimate_count: usize,
    pub over_estimate_time: f64,
    pub under_estimate_count: usize,
    pub under_estimate_time: f64,
    pub on_estimate_count: usize,
}

pub fn calculate_tracker_stats(tracker: &Tracker) -> TrackerStats {
    let active_count = tracker.active_tasks().count();
    let archived_count = tracker.archived_tasks().count();

    let total_spent = tracker.get_total_time_spent();
    let total_estimate: f64 = tracker.tasks().map(|t| t.estimate()).sum();

    let week_count = tracker.week_count();
    let average_per_week = if week_count > 0 {
        total_spent / week_count as f64
    } else {
        0.0
    };

    let busiest_week = (0..week_count)
        .map(|week| (week, tracker.get_time_for_week(week)))
        .filter(|(_, total)| *total > 0.0)
        .fold(None, |best: Option<(usize, f64)>, current| match best {
            Some(b) if b.1 >= current.1 => Some(b),
            _ => Some(current),
        });

    TrackerStats {
        total_tasks: active_count + archived_count,
        active_count,
        archived_count,
        total_spent,
        total_estimate,
        week_count,
        average_per_week,
        busiest_week,
    }
}

pub fn calculate_estimation_stats(tracker: &Tracker) -> EstimationStats {
    let mut stats = EstimationStats {
        over_estimate_count: 0,
        over_estimate_time: 0.0,
        under_estimate_count: 0,
        under_estimate_time: 0.0,
        on_estimate_count: 0,
    };

    for task in tracker.tasks().filter(|t| t.estimate() > 0.0) {
        let remaining = task.remaining();
        if remaining < 0.0 {
            stats.over_estimate_count += 1;
            stats.over_estimate_time += -remaining;
        } else if remaining > 0.0 {
            stats.under_estimate_count += 1;
            stats.under_estimate_time += remaining;
        } else {
            stats.on_estimate_count += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample() -> Tracker {
        let mut tracker = Tracker::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        tracker.add_week();
        tracker.create_task("A").unwrap();
        tracker.add_subtask("A", "a1").unwrap();
        tracker.set_subtask_estimate("A", "a1", 2.0).unwrap();
        tracker.update_week_values("A", 0, &[3.0]).unwrap();
        tracker.add_week();
        tracker.create_task("B").unwrap();
        tracker.add_subtask("B", "b1").unwrap();
        tracker.set_subtask_estimate("B", "b1", 4.0).unwrap();
        tracker.update_week_values("B", 1, &[1.0]).unwrap();
        tracker.add_week();
        tracker.archive_task("B").unwrap();
        tracker
    }

    #[test]
    fn test_tracker_stats() {
        let stats = calculate_tracker_stats(&sample());
        assert_eq!(
            stats,
            TrackerStats {
                total_tasks: 2,
                active_count: 1,
                archived_count: 1,
                total_spent: 4.0,
                total_estimate: 6.0,
                week_count: 3,
                average_per_week: 4.0 / 3.0,
                busiest_week: Some((0, 3.0)),
            }
        );
    }

    #[test]
    fn test_tracker_stats_empty() {
        let tracker = Tracker::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let stats = calculate_tracker_stats(&tracker);
        assert_eq!(stats.average_per_week, 0.0);
        assert_eq!(stats.busiest_week, None);
    }

    #[test]
    fn test_estimation_stats() {
        let stats = calculate_estimation_stats(&sample());
        assert_eq!(
            stats,
            EstimationStats {
                over_estimate_count: 1,
                over_estimate_time: 1.0,
                under_estimate_count: 1,
                under_estimate_time: 3.0,
                on_estimate_count: 0,
            }
        );
    }
}
