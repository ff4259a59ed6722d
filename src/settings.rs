use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BihinError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// Fixed reporting period; when unset the current date is used.
    #[serde(default)]
    pub period_year: Option<i32>,
    #[serde(default)]
    pub period_month: Option<u32>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

fn default_csv_path() -> String {
    "purchases.csv".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_recent_count() -> usize {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            period_year: None,
            period_month: None,
            top_n: default_top_n(),
            recent_count: default_recent_count(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bihin")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BihinError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            csv_path: "/tmp/orders.csv".to_string(),
            period_year: Some(2022),
            period_month: Some(9),
            top_n: 5,
            recent_count: 2,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.csv_path, "/tmp/orders.csv");
        assert_eq!(loaded.period_year, Some(2022));
        assert_eq!(loaded.period_month, Some(9));
        assert_eq!(loaded.top_n, 5);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.csv_path, "purchases.csv");
        assert!(s.period_year.is_none());
        assert_eq!(s.top_n, 10);
        assert_eq!(s.recent_count, 3);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"csv_path": "/data/注文履歴.csv"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.csv_path, "/data/注文履歴.csv");
        assert_eq!(s.top_n, 10);
        assert_eq!(s.recent_count, 3);
        assert!(s.period_month.is_none());
    }

    #[test]
    fn test_shellexpand_keeps_missing_relative_path() {
        assert_eq!(shellexpand_path("does-not-exist.csv"), "does-not-exist.csv");
    }
}
