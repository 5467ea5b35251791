//! Logging setup for the CLI.
//!
//! Logs go to stderr so that reports on stdout stay machine-readable.
//!
//! ## Environment Variables
//!
//! 1. **`INCOMPAT_SCAN_LOG`** (highest priority). A bare level such as
//!    `debug` applies to the incompat-scan crates only; anything containing
//!    `=`, `:` or `,` is used as a full filter.
//! 2. **`RUST_LOG`**: standard tracing environment variable.
//! 3. **Default**: `warn` globally, `info` for incompat-scan crates.

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

const CRATES: &[&str] = &["incompat_scan", "incompat_scan_core"];

/// Install the global subscriber.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Create the [`EnvFilter`], honouring `INCOMPAT_SCAN_LOG` > `RUST_LOG` > defaults.
fn create_filter() -> EnvFilter {
    if let Ok(level) = env::var("INCOMPAT_SCAN_LOG") {
        return EnvFilter::new(expand_log_directive(&level));
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(expand_log_directive("info"))
}

/// Expand a bare level into per-crate directives.
///
/// `debug` becomes `warn,incompat_scan=debug,incompat_scan_core=debug`;
/// advanced syntax is passed through unchanged.
fn expand_log_directive(value: &str) -> String {
    if value.contains('=') || value.contains(':') || value.contains(',') {
        return value.to_string();
    }

    let mut directive = String::from("warn");
    for name in CRATES {
        directive.push_str(&format!(",{}={}", name, value));
    }
    directive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_bare_level() {
        assert_eq!(
            expand_log_directive("debug"),
            "warn,incompat_scan=debug,incompat_scan_core=debug"
        );
    }

    #[test]
    fn test_expand_passes_advanced_syntax_through() {
        assert_eq!(
            expand_log_directive("incompat_scan_core=trace"),
            "incompat_scan_core=trace"
        );
    }
}
