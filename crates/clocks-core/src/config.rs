//! Configuration for the time-travel core.
//!
//! Configuration is read from `clocks.jsonc` or `clocks.json` in a directory.
//! Comments (`//` and `/* */`) are allowed; every field is optional and a
//! missing file means all defaults.

use crate::error::{ConfigError, CoreResult};
use clocks_history::DEFAULT_MAX_ENTRIES;
use clocks_util::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file names, in lookup order.
const CONFIG_FILE_NAMES: [&str; 2] = ["clocks.jsonc", "clocks.json"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// History ledger settings.
    pub history: HistoryConfig,

    /// Which stores write their snapshot to storage on every change.
    pub persistence: PersistenceConfig,

    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

/// How store histories are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// One ledger of combined document + view-state snapshots.
    #[default]
    Shared,
    /// One independently scrubbable ledger per store.
    PerStore,
}

/// History ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub mode: HistoryMode,
    /// Maximum entries per ledger; the oldest are evicted beyond this.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mode: HistoryMode::Shared,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Per-store persistence switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub document: bool,
    pub view_state: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        // View state is session-only unless asked for
        Self {
            document: true,
            view_state: false,
        }
    }
}

impl Config {
    /// Load configuration from `dir`, falling back to defaults when no
    /// config file exists.
    ///
    /// Returns the config and the file it came from, if any.
    pub async fn load(dir: &Path) -> CoreResult<(Self, Option<PathBuf>)> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if tokio::fs::try_exists(&path).await? {
                let config = Self::load_file(&path).await?;
                info!(path = %path.display(), "Loaded configuration");
                return Ok((config, Some(path)));
            }
        }

        debug!(dir = %dir.display(), "No config file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Save configuration as `clocks.json` in `dir`.
    pub async fn save(&self, dir: &Path) -> CoreResult<PathBuf> {
        let path = dir.join("clocks.json");
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, content).await?;
        info!("Saved configuration to {}", path.display());
        Ok(path)
    }

    /// Logging setup for this configuration.
    pub fn log_config(&self, print: bool) -> LogConfig {
        LogConfig {
            print,
            level: self.log_level.unwrap_or_default(),
            ..LogConfig::default()
        }
    }

    /// Install the global log subscriber at the configured level.
    ///
    /// Returns `false` when a subscriber is already installed.
    pub fn init_logging(&self, print: bool) -> bool {
        clocks_util::log::init(self.log_config(print))
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_entries == 0 {
            return Err(ConfigError::validation(
                "history.max_entries must be at least 1",
            ));
        }
        Ok(())
    }

    /// Parse and validate JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        let stripped = Self::strip_comments(content);

        let config: Self = serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Strip JSON comments, leaving string contents alone.
    fn strip_comments(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(c) = chars.next() {
            if escape_next {
                result.push(c);
                escape_next = false;
                continue;
            }

            if in_string {
                match c {
                    '\\' => escape_next = true,
                    '"' => in_string = false,
                    _ => {}
                }
                result.push(c);
                continue;
            }

            let next = chars.peek().copied();
            match (c, next) {
                ('"', _) => {
                    in_string = true;
                    result.push(c);
                }
                ('/', Some('/')) => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            result.push('\n');
                            break;
                        }
                    }
                }
                ('/', Some('*')) => {
                    chars.next();
                    let mut prev = ' ';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        // Keep line numbers stable for error messages
                        if c == '\n' {
                            result.push('\n');
                        }
                        prev = c;
                    }
                }
                _ => result.push(c),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.history.mode, HistoryMode::Shared);
        assert_eq!(config.history.max_entries, DEFAULT_MAX_ENTRIES);
        assert!(config.persistence.document);
        assert!(!config.persistence.view_state);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_log_config_uses_level() {
        let config = Config {
            log_level: Some(LogLevel::Trace),
            ..Config::default()
        };
        let log = config.log_config(true);
        assert!(log.print);
        assert_eq!(log.level, LogLevel::Trace);
        assert_eq!(Config::default().log_config(false).level, LogLevel::Info);
    }

    #[test]
    fn test_init_logging_once() {
        let config = Config::default();
        config.init_logging(false);
        assert!(!config.init_logging(true));
    }

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // Line comment
            "key": "value", // trailing comment
            /* block comment */
            "key2": "val/*not a comment*/ue",
            "key3": "escaped \" // still a string"
        }"#;

        let result = Config::strip_comments(input);
        assert!(!result.contains("Line comment"));
        assert!(!result.contains("trailing comment"));
        assert!(!result.contains("block comment"));
        assert!(result.contains("val/*not a comment*/ue"));
        assert!(result.contains(r#"escaped \" // still a string"#));
    }

    #[test]
    fn test_parse_jsonc_partial() {
        let input = r#"{
            // Independent scrubbers for each store
            "history": { "mode": "per_store" },
            "log_level": "debug"
        }"#;

        let config = Config::parse_jsonc(input, "test").unwrap();
        assert_eq!(config.history.mode, HistoryMode::PerStore);
        assert_eq!(config.history.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(config.log_level, Some(LogLevel::Debug));
        assert!(config.persistence.document);
    }

    #[test]
    fn test_parse_rejects_zero_entries() {
        let err = Config::parse_jsonc(r#"{"history": {"max_entries": 0}}"#, "test").unwrap_err();
        assert!(err.to_string().contains("max_entries"));
    }

    #[test]
    fn test_parse_invalid_json_names_source() {
        let err = Config::parse_jsonc("{ nope", "clocks.json").unwrap_err();
        assert!(err.to_string().contains("clocks.json"));
    }

    #[tokio::test]
    async fn test_load_missing_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, source) = Config::load(dir.path()).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(source.is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            history: HistoryConfig {
                mode: HistoryMode::PerStore,
                max_entries: 7,
            },
            persistence: PersistenceConfig {
                document: false,
                view_state: true,
            },
            log_level: Some(LogLevel::Warn),
        };

        let path = config.save(dir.path()).await.unwrap();
        let (loaded, source) = Config::load(dir.path()).await.unwrap();

        assert_eq!(loaded, config);
        assert_eq!(source, Some(path));
    }

    #[tokio::test]
    async fn test_jsonc_preferred_over_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clocks.json"), r#"{"history": {"max_entries": 5}}"#)
            .unwrap();
        std::fs::write(
            dir.path().join("clocks.jsonc"),
            "{ /* preferred */ \"history\": {\"max_entries\": 9} }",
        )
        .unwrap();

        let (config, _) = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.history.max_entries, 9);
    }
}
