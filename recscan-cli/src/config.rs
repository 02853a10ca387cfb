//! CLI configuration
//!
//! Per-target log levels plus the optional JSON project file that can
//! override the command line defaults.

use std::path::Path;

use serde::Deserialize;
use tracing::Level;

/// CLI log configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub cursor: Option<Level>,
    pub driver: Option<Level>,
    pub channel: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            cursor: None,
            driver: None,
            channel: None,
        }
    }
}

impl LogConfig {
    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "recscan::cursor" => self.cursor.unwrap_or(self.global),
            "recscan::driver" => self.driver.unwrap_or(self.global),
            "recscan::channel" => self.channel.unwrap_or(self.global),
            _ => self.global,
        }
    }
}

/// Optional project file settings, JSON.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Buffer size hint in bytes.
    pub buflen: Option<usize>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: Option<String>,
    /// Dump the raw token stream as JSON instead of reformatting.
    pub dump_tokens: Option<bool>,
}

/// Read and parse a project config file.
pub fn read_project_config(path: &Path) -> Result<ProjectConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

/// Parse a log level string.
pub fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let config = LogConfig {
            global: Level::WARN,
            cursor: Some(Level::TRACE),
            ..LogConfig::default()
        };
        assert_eq!(config.level_for("recscan::cursor"), Level::TRACE);
        assert_eq!(config.level_for("recscan::driver"), Level::WARN);
        assert_eq!(config.level_for("something::else"), Level::WARN);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("warn"), Some(Level::WARN));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_project_config_from_json() {
        let config: ProjectConfig =
            serde_json::from_str(r#"{"buflen": 4096, "log_level": "debug"}"#).unwrap();
        assert_eq!(config.buflen, Some(4096));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.dump_tokens, None);
    }
}
