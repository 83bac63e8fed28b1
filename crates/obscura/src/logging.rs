//! Logging setup for obscura.
//!
//! Everything logs through `tracing` under the `obscura` target:
//!
//! - `info`: plugin load and unload, preset and keyword deletions, notices
//! - `debug`: selection and highlight transitions, committed settings,
//!   panel actions
//! - `trace`: every element the effect engine blurs or clears
//!
//! The level comes from the command-line flags, and the persisted
//! `isDebugMode` setting lifts the default level to `debug` without any flag.
//! `RUST_LOG` overrides both.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Lifecycle events and notices.
    #[default]
    Normal,
    /// State transitions and settings commits.
    Verbose,
    /// Per-element effect application.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a level. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Raise `Normal` to `Verbose` when the persisted debug mode is on.
    ///
    /// Explicit choices (`Quiet`, `Verbose`, `Trace`) are left alone.
    #[must_use]
    pub fn with_debug_mode(self, debug_mode: bool) -> Self {
        match self {
            Self::Normal if debug_mode => Self::Verbose,
            other => other,
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        format!("obscura={}", self.to_level_filter())
    }
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean.
///
/// Only the first call installs anything.
///
/// # Examples
///
/// ```no_run
/// use obscura::{init_logging, logging::Verbosity};
///
/// let settings_debug_mode = true;
/// init_logging(Verbosity::from_flags(0, false).with_debug_mode(settings_debug_mode));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let directive = verbosity.filter_directive();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr),
    );

    let _ = subscriber.try_init();
}

/// Quiet logging for tests: warnings and errors only.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_verbosity() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(2, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(5, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
    }

    #[test]
    fn test_filter_directive_targets_crate() {
        assert_eq!(Verbosity::Quiet.filter_directive(), "obscura=ERROR");
        assert_eq!(Verbosity::Normal.filter_directive(), "obscura=INFO");
        assert_eq!(Verbosity::Trace.filter_directive(), "obscura=TRACE");
    }

    #[test]
    fn test_debug_mode_raises_default_level_only() {
        assert_eq!(Verbosity::Normal.with_debug_mode(true), Verbosity::Verbose);
        assert_eq!(Verbosity::Normal.with_debug_mode(false), Verbosity::Normal);
        assert_eq!(Verbosity::Quiet.with_debug_mode(true), Verbosity::Quiet);
        assert_eq!(Verbosity::Trace.with_debug_mode(true), Verbosity::Trace);
    }

    #[test]
    fn test_debug_mode_logs_transitions() {
        let level = Verbosity::from_flags(0, false)
            .with_debug_mode(true)
            .to_level_filter();
        assert_eq!(level, Level::DEBUG);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Trace);
        init_test_logging();
    }
}
