//! Optimizer configuration

use log::LevelFilter;

use crate::error::{GraphResult, TransformError};
use crate::logging::Logger;
use crate::pattern::ops::BIAS_GELU_BACKENDS;

use super::core::TransformerLevel;

/// Optimization options
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOptions {
    /// Highest transformer level to run
    pub level: TransformerLevel,
    /// Maximum rounds per level before the driver gives up on a fixed point
    pub max_steps: usize,
    /// Severity floor of the session logger
    pub log_severity: LevelFilter,
    /// Transformer names to skip
    pub disabled_transformers: Vec<String>,
    /// Backends the fusion passes may rewrite on; empty means all
    pub compatible_backends: Vec<String>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            level: TransformerLevel::Level2,
            max_steps: 10,
            log_severity: LevelFilter::Warn,
            disabled_transformers: Vec::new(),
            compatible_backends: BIAS_GELU_BACKENDS.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl OptimizeOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the optimization level
    pub fn with_level(mut self, level: TransformerLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the maximum rounds per level
    ///
    /// Zero is rejected when a manager is built from these options.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the session log severity
    pub fn with_log_severity(mut self, severity: LevelFilter) -> Self {
        self.log_severity = severity;
        self
    }

    /// Skip a transformer by name
    pub fn disable(mut self, name: &str) -> Self {
        self.disabled_transformers.push(name.to_string());
        self
    }

    /// Replace the compatible backend list
    pub fn with_backends(mut self, backends: &[&str]) -> Self {
        self.compatible_backends = backends.iter().map(|b| b.to_string()).collect();
        self
    }

    /// Session logger configured by these options
    pub fn logger(&self, id: &str) -> Logger {
        Logger::new(id, self.log_severity)
    }

    /// Parse `key=value` settings on top of the defaults
    ///
    /// Keys: `level`, `max_steps`, `log_level`, `disable` (comma list,
    /// appended) and `backends` (comma list, replaces the default).
    pub fn from_pairs<'a, I>(pairs: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut options = Self::default();

        for pair in pairs {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                TransformError::InvalidConfig(format!("expected key=value, got '{}'", pair))
            })?;
            let value = value.trim();

            match key.trim() {
                "level" => options.level = value.parse()?,
                "max_steps" => {
                    options.max_steps = value.parse().map_err(|_| {
                        TransformError::InvalidConfig(format!("invalid max_steps '{}'", value))
                    })?;
                }
                "log_level" => {
                    options.log_severity = value.parse().map_err(|_| {
                        TransformError::InvalidConfig(format!("invalid log_level '{}'", value))
                    })?;
                }
                "disable" => options
                    .disabled_transformers
                    .extend(split_list(value).map(str::to_string)),
                "backends" => {
                    options.compatible_backends = split_list(value).map(str::to_string).collect()
                }
                other => {
                    return Err(TransformError::InvalidConfig(format!(
                        "unknown option '{}'",
                        other
                    )))
                }
            }
        }

        check_max_steps(options.max_steps)?;
        Ok(options)
    }
}

/// Reject a round limit that would never run a transformer
pub(crate) fn check_max_steps(max_steps: usize) -> GraphResult<usize> {
    if max_steps == 0 {
        return Err(TransformError::InvalidConfig(
            "max_steps must be at least 1".to_string(),
        ));
    }
    Ok(max_steps)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
