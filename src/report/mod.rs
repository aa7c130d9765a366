pub mod generator;
pub mod stats;

pub use generator::{generate_report, write_report};
pub use stats::{calculate_estimation_stats, calculate_tracker_stats, EstimationStats, TrackerStats};
