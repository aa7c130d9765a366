use std::sync::LazyLock;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn crate_target() -> String {
    env!("CARGO_PKG_NAME").replace('-', "_")
}

/// Filter from the `RUST_LOG` value and the CLI level.
///
/// Without `RUST_LOG` only this crate's warnings and errors pass. Malformed
/// directives in `RUST_LOG` are skipped. `log_level` is applied to this crate
/// on top of whatever `RUST_LOG` says.
pub fn build_filter(rust_log: Option<&str>, log_level: Option<LevelFilter>) -> Result<EnvFilter> {
    let crate_directive =
        |level: LevelFilter| format!("{}={}", crate_target(), level.to_string().to_lowercase());

    let Some(dirs) = rust_log.map(str::trim).filter(|dirs| !dirs.is_empty()) else {
        return Ok(EnvFilter::try_new(crate_directive(log_level.unwrap_or(LevelFilter::WARN)))?);
    };
    let mut filter = EnvFilter::builder().parse_lossy(dirs);
    if let Some(level) = log_level {
        filter = filter.add_directive(crate_directive(level).parse()?);
    }
    Ok(filter)
}

/// Install the stderr subscriber
pub fn enable_logging(log_level: Option<LevelFilter>) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(rust_log.as_deref(), log_level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
});

#[cfg(test)]
mod tests {
    use super::*;

    fn render(filter: EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn test_default_filter_is_crate_warnings() {
        assert_eq!(render(build_filter(None, None).unwrap()), "weektrack=warn");
        assert_eq!(render(build_filter(Some("  "), None).unwrap()), "weektrack=warn");
    }

    #[test]
    fn test_rust_log_with_crate_directive() {
        let text = render(build_filter(Some("weektrack=debug"), None).unwrap());
        assert!(text.contains("weektrack=debug"));

        let text = render(build_filter(Some("info,weektrack=trace"), None).unwrap());
        assert!(text.contains("weektrack=trace"));
    }

    #[test]
    fn test_malformed_rust_log_is_skipped() {
        assert!(build_filter(Some("weektrack=loud,[broken"), None).is_ok());
    }

    #[test]
    fn test_verbose_applies_with_rust_log_set() {
        let text = render(build_filter(Some("error"), Some(LevelFilter::DEBUG)).unwrap());
        assert!(text.contains("error"));
        assert!(text.contains("weektrack=debug"));

        let text = render(build_filter(None, Some(LevelFilter::DEBUG)).unwrap());
        assert_eq!(text, "weektrack=debug");
    }
}
