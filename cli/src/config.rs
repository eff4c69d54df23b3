use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use foodlog_core::render::ColumnWidths;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    db_path: Option<PathBuf>,
    log_level: Option<String>,
    columns: ColumnWidths,
}

pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub columns: ColumnWidths,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "foodlog").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let mut config = Self::load_from(&data_dir)?;
        config.apply_overrides(
            std::env::var("FOODLOG_DB").ok(),
            std::env::var("FOODLOG_LOG").ok(),
        );
        Ok(config)
    }

    /// Read `config.toml` from `data_dir` if present, falling back to defaults.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let file: FileConfig = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            FileConfig::default()
        };

        Ok(Config {
            db_path: file
                .db_path
                .unwrap_or_else(|| data_dir.join("foodlog.db")),
            log_level: file
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            columns: file.columns,
        })
    }

    /// Apply `FOODLOG_DB` / `FOODLOG_LOG` values. Empty values are ignored.
    fn apply_overrides(&mut self, db_path: Option<String>, log_level: Option<String>) {
        if let Some(db) = db_path.filter(|v| !v.trim().is_empty()) {
            self.db_path = PathBuf::from(db);
        }
        if let Some(level) = log_level.filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.db_path, dir.path().join("foodlog.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.columns, ColumnWidths::default());
    }

    #[test]
    fn test_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
db_path = "/tmp/custom.db"
log_level = "debug"

[columns]
food_name = 40
"#,
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.columns.food_name, 40);
        // unset widths keep their defaults
        assert_eq!(config.columns.entry_id, 16);
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "log_level = [").unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path()).unwrap();

        config.apply_overrides(Some("/tmp/env.db".to_string()), Some("info".to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/env.db"));
        assert_eq!(config.log_level, "info");

        config.apply_overrides(Some(String::new()), None);
        assert_eq!(config.db_path, PathBuf::from("/tmp/env.db"));
        assert_eq!(config.log_level, "info");
    }
}
