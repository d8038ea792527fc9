use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::{BaseDirs, ProjectDirs};

/// Fallback folder beneath the home directory when no platform data dir exists.
const DATA_DIR_NAME: &str = ".library-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.db";
/// Log file kept next to the database; the terminal belongs to the UI.
const LOG_FILE_NAME: &str = "library.log";

/// Lending rules applied when issuing books and reporting overdue loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Days between issue and due date.
    pub loan_days: i64,
    /// Fine charged per day past the due date.
    pub fine_per_day: i64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_days: 14,
            fine_per_day: 10,
        }
    }
}

/// Where the catalog keeps its files and which lending rules it applies.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub policy: LendingPolicy,
}

impl AppConfig {
    /// Resolve the platform data directory for the application.
    pub fn resolve() -> Result<Self> {
        let data_dir = match ProjectDirs::from("", "", "library-catalog") {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => {
                let base_dirs =
                    BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
                base_dirs.home_dir().join(DATA_DIR_NAME)
            }
        };
        Ok(Self::with_data_dir(data_dir))
    }

    /// Build a configuration rooted at an explicit directory.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            policy: LendingPolicy::default(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_data_dir() {
        let config = AppConfig::with_data_dir("/tmp/catalog");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/catalog/library.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/catalog/library.log"));
    }

    #[test]
    fn default_policy_lends_for_two_weeks() {
        let policy = LendingPolicy::default();
        assert_eq!(policy.loan_days, 14);
        assert_eq!(policy.fine_per_day, 10);
    }
}
