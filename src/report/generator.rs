use crate::domain::{task_rows, week_columns, Tracker};
use crate::report::stats::{calculate_estimation_stats, calculate_tracker_stats};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Format a time value with up to two decimals, trimming trailing zeros
fn format_time(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Render a markdown report of the tracker
pub fn generate_report(tracker: &Tracker) -> String {
    let global = calculate_tracker_stats(tracker);
    let estimation = calculate_estimation_stats(tracker);

    let mut report = String::new();

    report.push_str(&format!("# Weekly Report - since {}\n\n", tracker.first_date));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Total Tasks:** {} (Active: {}, Archived: {})\n",
        global.total_tasks, global.active_count, global.archived_count
    ));

    let completion_pct = if global.total_estimate > 0.0 {
        global.total_spent / global.total_estimate * 100.0
    } else {
        0.0
    };
    report.push_str(&format!(
        "- **Total Time:** {} / {} estimated ({})\n",
        format_time(global.total_spent),
        format_time(global.total_estimate),
        format_percent(completion_pct)
    ));
    report.push_str(&format!(
        "- **Weeks:** {} (average {} per week)\n",
        global.week_count,
        format_time(global.average_per_week)
    ));
    if let Some((week, total)) = global.busiest_week {
        report.push_str(&format!(
            "- **Busiest Week:** {} ({})\n",
            tracker.week_label(week),
            format_time(total)
        ));
    }
    report.push('\n');

    // Estimates Section
    if estimation.over_estimate_count + estimation.under_estimate_count + estimation.on_estimate_count > 0 {
        report.push_str("## Estimates\n\n");
        report.push_str(&format!(
            "- **Over estimate:** {} tasks (+{})\n",
            estimation.over_estimate_count,
            format_time(estimation.over_estimate_time)
        ));
        report.push_str(&format!(
            "- **Under estimate:** {} tasks (-{})\n",
            estimation.under_estimate_count,
            format_time(estimation.under_estimate_time)
        ));
        report.push_str(&format!("- **On estimate:** {} tasks\n\n", estimation.on_estimate_count));
    }

    // Weeks Section
    let columns = week_columns(tracker);
    if !columns.is_empty() {
        report.push_str("## Weeks\n\n");
        report.push_str("| Week | Starting | Total |\n");
        report.push_str("|---|---|---|\n");
        for column in &columns {
            report.push_str(&format!(
                "| {} | {} | {} |\n",
                column.index,
                column.label,
                format_time(column.total)
            ));
        }
        report.push('\n');
    }

    // Tasks Section
    let rows = task_rows(tracker);
    if !rows.is_empty() {
        report.push_str("## Tasks\n\n");
        for row in &rows {
            report.push_str(&format!("- **{}**\n", row.name));
            report.push_str(&format!(
                "  - Spent: {} | Estimate: {} | Remaining: {}\n",
                format_time(row.spent),
                format_time(row.estimate),
                format_time(row.remaining)
            ));
            for subtask in &row.subtasks {
                report.push_str(&format!(
                    "    - {} ({} / {})\n",
                    subtask.name,
                    format_time(subtask.spent),
                    format_time(subtask.estimate)
                ));
            }
        }
        report.push('\n');
    }

    // Archived Tasks
    let archived: Vec<_> = tracker.archived_tasks().collect();
    if !archived.is_empty() {
        report.push_str("## Archived Tasks\n\n");
        for task in archived {
            report.push_str(&format!(
                "- [~] **{}** ({} / {})\n",
                task.name,
                format_time(task.get_total_time_spent()),
                format_time(task.estimate())
            ));
        }
        report.push('\n');
    }

    report
}

/// Write the report next to the tracker file, or to `output_path` when given
pub fn write_report(tracker: &Tracker, tracker_path: &Path, output_path: Option<PathBuf>) -> Result<PathBuf> {
    let output = match output_path {
        Some(path) => path,
        None => {
            let dir = tracker_path.parent().unwrap_or_else(|| Path::new("."));
            dir.join(format!("report-{}.md", chrono::Local::now().format("%Y-%m-%d")))
        }
    };

    fs::write(&output, generate_report(tracker))
        .with_context(|| format!("Failed to write report: {}", output.display()))?;

    Ok(output)
}
