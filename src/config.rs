/// Client configuration.
/// Resolved once at startup from command-line flags and environment.

use crate::error::{ClientError, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:4000";

/// Directory under the home directory used when none is given
pub const DEFAULT_DIR_NAME: &str = ".ibooks";

/// File holding the persisted session
pub const DB_FILE: &str = "client.db";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub data_dir: PathBuf,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
    /// Approve every confirmation prompt without asking
    pub assume_yes: bool,
}

impl ClientConfig {
    /// Build a config, falling back to `~/.ibooks` when no data dir is given
    pub fn new(server_url: &str, data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        Ok(ClientConfig {
            server_url: server_url.trim_end_matches('/').to_string(),
            data_dir,
            timeout_secs: None,
            assume_yes: false,
        })
    }

    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs.filter(|s| *s > 0);
        self
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Create the data directory if it is missing
    pub fn ensure_data_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| ClientError::Config("Failed to get home directory".to_string()))?;
    Ok(base_dirs.home_dir().join(DEFAULT_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_data_dir() {
        let config = ClientConfig::new("http://localhost:4000/", Some(PathBuf::from("/tmp/ib")))
            .unwrap();
        assert_eq!(config.server_url, "http://localhost:4000");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/ib/client.db"));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ClientConfig::new(DEFAULT_SERVER_URL, Some(PathBuf::from("x")))
            .unwrap()
            .with_timeout(Some(0));
        assert_eq!(config.timeout(), None);

        let config = config.with_timeout(Some(5));
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_ensure_data_dir_creates_nested() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("a").join("b");
        let config = ClientConfig::new(DEFAULT_SERVER_URL, Some(dir.clone())).unwrap();
        config.ensure_data_dir().unwrap();
        assert!(dir.is_dir());
    }
}
