//! Settings and configuration utilities.
//!
//! Values are resolved from, in order: an explicit CLI flag, the process
//! environment, the `env` map of `$HOME/.git-introduced/settings.json`,
//! and finally a built-in default.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::git::command::DEFAULT_QUERY_TIMEOUT;

/// Maximum number of concurrent per-commit queries.
pub const CONCURRENCY_KEY: &str = "GIT_INTRODUCED_CONCURRENCY";
/// Per-query timeout in seconds.
pub const TIMEOUT_SECS_KEY: &str = "GIT_INTRODUCED_TIMEOUT_SECS";
/// Path or name of the git executable.
pub const GIT_PROGRAM_KEY: &str = "GIT_INTRODUCED_GIT";

/// Settings loaded from $HOME/.git-introduced/settings.json.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path; a missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Settings>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".git-introduced").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }

    /// Resolves a typed value: `flag`, then environment, then settings.
    ///
    /// Returns `Ok(None)` when no layer provides a value. A value that does
    /// not parse is an error naming the offending key.
    pub fn resolve<T>(&self, flag: Option<T>, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if flag.is_some() {
            return Ok(flag);
        }
        match self.get_env_var(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("Invalid value '{raw}' for {key}: {e}")),
            None => Ok(None),
        }
    }

    /// Number of concurrent per-commit queries, at least one.
    pub fn concurrency(&self, flag: Option<usize>) -> Result<usize> {
        let value = self
            .resolve(flag, CONCURRENCY_KEY)?
            .unwrap_or_else(crate::finder::default_concurrency);
        if value == 0 {
            anyhow::bail!("{CONCURRENCY_KEY} must be at least 1");
        }
        Ok(value)
    }

    /// Timeout applied to every git invocation.
    pub fn query_timeout(&self, flag: Option<u64>) -> Result<Duration> {
        match self.resolve(flag, TIMEOUT_SECS_KEY)? {
            Some(0) => anyhow::bail!("{TIMEOUT_SECS_KEY} must be at least 1 second"),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(DEFAULT_QUERY_TIMEOUT),
        }
    }

    /// The git executable to run.
    pub fn git_program(&self) -> String {
        self.get_env_var(GIT_PROGRAM_KEY)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "git".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings_with(json: &str) -> (TempDir, Settings) {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, json).unwrap();
        let settings = Settings::load_from_path(&settings_path).unwrap();
        (temp_dir, settings)
    }

    #[test]
    fn settings_load_from_path() {
        let (_dir, settings) = settings_with(
            r#"{
                "env": {
                    "GIT_INTRODUCED_TEST_A": "a",
                    "GIT_INTRODUCED_TEST_B": "b"
                }
            }"#,
        );
        assert_eq!(settings.env.get("GIT_INTRODUCED_TEST_A").unwrap(), "a");
        assert_eq!(settings.env.get("GIT_INTRODUCED_TEST_B").unwrap(), "b");
    }

    #[test]
    fn missing_file_is_empty_settings() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("absent.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn environment_takes_precedence_over_settings() {
        let (_dir, settings) = settings_with(r#"{ "env": { "GIT_INTRODUCED_TEST_PREC": "file" } }"#);

        env::set_var("GIT_INTRODUCED_TEST_PREC", "env");
        assert_eq!(settings.get_env_var("GIT_INTRODUCED_TEST_PREC").unwrap(), "env");

        env::remove_var("GIT_INTRODUCED_TEST_PREC");
        assert_eq!(settings.get_env_var("GIT_INTRODUCED_TEST_PREC").unwrap(), "file");
    }

    #[test]
    fn flag_beats_every_other_layer() {
        let (_dir, settings) = settings_with(r#"{ "env": { "GIT_INTRODUCED_TEST_FLAG": "3" } }"#);
        let value: Option<usize> = settings.resolve(Some(9), "GIT_INTRODUCED_TEST_FLAG").unwrap();
        assert_eq!(value, Some(9));
        let value: Option<usize> = settings.resolve(None, "GIT_INTRODUCED_TEST_FLAG").unwrap();
        assert_eq!(value, Some(3));
    }

    #[test]
    fn unparsable_value_names_the_key() {
        let (_dir, settings) = settings_with(r#"{ "env": { "GIT_INTRODUCED_TEST_BAD": "many" } }"#);
        let err = settings
            .resolve::<usize>(None, "GIT_INTRODUCED_TEST_BAD")
            .unwrap_err();
        assert!(err.to_string().contains("GIT_INTRODUCED_TEST_BAD"));
    }

    #[test]
    fn explicit_values_are_validated() {
        let settings = Settings::default();
        assert_eq!(settings.concurrency(Some(2)).unwrap(), 2);
        assert!(settings.concurrency(Some(0)).is_err());
        assert_eq!(
            settings.query_timeout(Some(5)).unwrap(),
            Duration::from_secs(5)
        );
        assert!(settings.query_timeout(Some(0)).is_err());
    }
}
