use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::source::SourceKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Reads configuration from the process environment (after `.env` has
    /// been loaded by the caller). Every value has a default.
    pub fn from_env() -> Self {
        Self {
            db_url: std::env::var("DB_URL")
                .unwrap_or_else(|_| "sqlite://data/registry.db?mode=rwc".to_string()),
            data_dir: PathBuf::from(
                std::env::var("DATA_DIR").unwrap_or_else(|_| "./data/temp".to_string()),
            ),
            fetch_timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            ),
            user_agent: std::env::var("USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        }
    }

    /// Config rooted at `data_dir`, used by tests and embedders.
    pub fn with_data_dir(db_url: impl Into<String>, data_dir: impl AsRef<Path>) -> Self {
        Self {
            db_url: db_url.into(),
            data_dir: data_dir.as_ref().to_path_buf(),
            fetch_timeout: Duration::from_secs(300),
            user_agent: default_user_agent(),
        }
    }

    /// Local path of a source extract.
    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }
}

fn default_user_agent() -> String {
    format!("registry-importer/{}", env!("CARGO_PKG_VERSION"))
}
