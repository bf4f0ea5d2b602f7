//! Diagnostic logging setup.

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level,
/// plus the merge directive when merge tracing is on.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let base = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| config.level.clone());
    let directives = match config.merge_directive() {
        Some(merge) if base.is_empty() => merge.to_string(),
        Some(merge) => format!("{base},{merge}"),
        None => base,
    };
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directives}': {e}");
        EnvFilter::new("warn")
    })
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `CDX_TOOLS_DEBUG_MERGE` is applied on top of `config`. Returns `false`
/// when a subscriber was already installed, in which case nothing changes.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let mut config = config.clone();
    config.apply_env_overrides();

    tracing_subscriber::registry()
        .with(build_filter(&config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.show_target),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes_merge_directive() {
        let config = LoggingConfig {
            level: "info".into(),
            debug_merge: 2,
            show_target: false,
        };
        let filter = build_filter(&config).to_string();
        assert!(filter.contains("cdx_tools::merge=trace"), "{filter}");
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
