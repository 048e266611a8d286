//! Verbosity configuration.

use tracing::level_filters::LevelFilter;

/// Environment variable holding an `EnvFilter` directive that overrides `-v`.
pub const LOG_ENV_VAR: &str = "FS_INTERPRETER_LOG";

/// How much the helper logs and where the filter came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogConfig {
    level: LevelFilter,
    directive_override: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_verbose_level(0)
    }
}

impl LogConfig {
    /// Maps a `-v` count to a level: 0 warn, 1 info, 2 debug, 3+ trace.
    pub fn from_verbose_level(level: u8) -> Self {
        let level = match level {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        Self {
            level,
            directive_override: None,
        }
    }

    /// Applies [`LOG_ENV_VAR`] when it is set to a non-empty value.
    pub fn with_env_override(self) -> Self {
        let value = std::env::var(LOG_ENV_VAR).ok();
        self.with_directive_override(value)
    }

    /// Replaces the level-derived filter with `directive`. Blank directives
    /// are ignored.
    pub fn with_directive_override(mut self, directive: Option<String>) -> Self {
        self.directive_override = directive
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        self
    }

    /// Level selected by the verbose count.
    pub const fn level(&self) -> LevelFilter {
        self.level
    }

    /// `EnvFilter` directive the subscriber is built from.
    pub fn directive(&self) -> String {
        self.directive_override
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_ascii_lowercase())
    }
}
