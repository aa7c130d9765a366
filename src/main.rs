use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use weektrack::domain::{compute_totals, parse_entry, task_rows, week_columns, Tracker};
use weektrack::logging::enable_logging;
use weektrack::persistence::{init_local_dir, load_tracker, save_tracker, tracker_file};
use weektrack::report;

#[derive(Parser)]
#[command(name = "weektrack")]
#[command(about = "Track time spent on tasks and subtasks, week by week", long_about = None)]
struct Cli {
    /// Tracker file to use instead of the .weektrack directory
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Log what the tracker is doing
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .weektrack directory in the current directory
    Init,
    /// Show active tasks and visible weeks
    Show,
    /// Start a new week for every active task
    AddWeek,
    /// Create a task in the most recent week
    AddTask { name: String },
    /// Add a subtask to a task
    AddSubtask { task: String, name: String },
    /// Rename a task
    RenameTask { old: String, new: String },
    /// Rename a subtask
    RenameSubtask { task: String, old: String, new: String },
    /// Hide a task and stop adding weeks to it
    Archive { task: String },
    /// Restore an archived task
    Unarchive { task: String },
    /// Record time for a week, one value per subtask in order
    Log {
        task: String,
        week: usize,
        /// Blank or non-numeric values count as 0
        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Set the estimate of a subtask
    Estimate { task: String, subtask: String, value: String },
    /// Hide the oldest visible week
    HideWeek,
    /// Show one more week before the first visible one
    ShowWeek,
    /// Generate a markdown report
    Report {
        /// Output file path. Defaults to report-YYYY-MM-DD.md next to the tracker file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli.verbose.then_some(LevelFilter::DEBUG);
    enable_logging(level)?;

    if let Some(Commands::Init) = cli.command {
        let dir = init_local_dir()?;
        println!("Initialized tracker directory: {}", dir.display());
        return Ok(());
    }

    let path = match cli.file {
        Some(path) => path,
        None => tracker_file()?,
    };
    let mut tracker = load_tracker(&path)
        .with_context(|| format!("Failed to load tracker: {}", path.display()))?;

    let changed = match cli.command.unwrap_or(Commands::Show) {
        Commands::Init | Commands::Show => {
            print_tracker(&tracker);
            false
        }
        Commands::AddWeek => {
            let week = tracker.add_week();
            println!("Added week {} ({})", week, tracker.week_label(week));
            true
        }
        Commands::AddTask { name } => {
            tracker.create_task(&name)?;
            true
        }
        Commands::AddSubtask { task, name } => {
            tracker.add_subtask(&task, &name)?;
            true
        }
        Commands::RenameTask { old, new } => {
            tracker.rename_task(&old, &new)?;
            true
        }
        Commands::RenameSubtask { task, old, new } => {
            tracker.rename_subtask(&task, &old, &new)?;
            true
        }
        Commands::Archive { task } => {
            tracker.archive_task(&task)?;
            true
        }
        Commands::Unarchive { task } => {
            tracker.unarchive_task(&task)?;
            true
        }
        Commands::Log { task, week, values } => {
            let values: Vec<f64> = values.iter().map(|v| parse_entry(v)).collect();
            tracker.update_week_values(&task, week, &values)?;
            true
        }
        Commands::Estimate { task, subtask, value } => {
            tracker.set_subtask_estimate(&task, &subtask, parse_entry(&value))?;
            true
        }
        Commands::HideWeek => tracker.hide_oldest_week(),
        Commands::ShowWeek => tracker.show_previous_week(),
        Commands::Report { output } => {
            let report_path = report::write_report(&tracker, &path, output)?;
            println!("Report generated: {}", report_path.display());
            false
        }
    };

    if changed {
        save(&path, &tracker)?;
    }
    Ok(())
}

fn save(path: &Path, tracker: &Tracker) -> Result<()> {
    save_tracker(path, tracker).with_context(|| format!("Failed to save tracker: {}", path.display()))
}

fn print_tracker(tracker: &Tracker) {
    let columns = week_columns(tracker);
    if tracker.week_count() == 0 {
        println!("No weeks yet. Run 'weektrack add-week' to start.");
        return;
    }

    print!("{:<24}", "");
    for column in &columns {
        print!("{:>10}", column.label);
    }
    println!();
    print!("{:<24}", "Week total");
    for column in &columns {
        print!("{:>10.2}", column.total);
    }
    println!();

    for row in task_rows(tracker) {
        println!();
        print!("{:<24}", row.name);
        for column in &columns {
            match row.weeks.iter().find(|(week, _)| *week == column.index) {
                Some((_, total)) => print!("{:>10.2}", total),
                None => print!("{:>10}", "-"),
            }
        }
        println!(
            "   spent {:.2} / estimate {:.2} / remaining {:.2}",
            row.spent, row.estimate, row.remaining
        );
        for subtask in &row.subtasks {
            println!(
                "  {:<22}spent {:.2} / estimate {:.2} / remaining {:.2}",
                subtask.name, subtask.spent, subtask.estimate, subtask.remaining
            );
        }
    }

    let (spent, estimate) = compute_totals(tracker);
    println!();
    println!("Total: {:.2} spent of {:.2} estimated", spent, estimate);

    let archived: Vec<&str> = tracker.archived_tasks().map(|t| t.name.as_str()).collect();
    if !archived.is_empty() {
        println!("Archived: {}", archived.join(", "));
    }
}
