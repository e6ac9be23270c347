//! Pass-scoped logging
//!
//! Transformers log through the [`log`] facade. A [`Logger`] carries the
//! session id used as the log target plus a severity floor, so one
//! optimization session can be made quieter than the global logger.

use log::{Level, LevelFilter};

/// Default log target for passes run without an explicit session logger
pub const DEFAULT_LOGGER_ID: &str = "peephole_fusion";

/// Log through a [`Logger`], honoring its severity floor.
///
/// ```ignore
/// pass_log!(logger, log::Level::Debug, "fused {} nodes", count);
/// ```
macro_rules! pass_log {
    ($logger:expr, $lvl:expr, $($arg:tt)+) => {{
        let logger: &$crate::logging::Logger = $logger;
        let level: ::log::Level = $lvl;
        if logger.enabled(level) {
            ::log::log!(target: logger.id(), level, $($arg)+);
        }
    }};
}

/// Session logger handed to every transformer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    id: String,
    severity: LevelFilter,
}

impl Logger {
    /// Create a logger with the given target id and severity floor
    pub fn new(id: impl Into<String>, severity: LevelFilter) -> Self {
        Self {
            id: id.into(),
            severity,
        }
    }

    /// Log target
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Severity floor
    pub fn severity(&self) -> LevelFilter {
        self.severity
    }

    /// Whether a record at `level` passes this logger's floor
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.severity
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_LOGGER_ID, LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_floor() {
        let logger = Logger::new("session_0", LevelFilter::Warn);
        assert!(logger.enabled(Level::Error));
        assert!(logger.enabled(Level::Warn));
        assert!(!logger.enabled(Level::Debug));
    }

    #[test]
    fn test_off_disables_everything() {
        let logger = Logger::new("quiet", LevelFilter::Off);
        assert!(!logger.enabled(Level::Error));
    }

    #[test]
    fn test_macro_accepts_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
        let logger = Logger::default();
        pass_log!(&logger, Level::Info, "graph {} visited", "main");
        assert_eq!(logger.id(), DEFAULT_LOGGER_ID);
    }
}
