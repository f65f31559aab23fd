use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Which columns of a tracked table the engine keeps in its snapshot store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnCacheSpec {
    /// Cache every column (the default when a table has no entry in `columnCache`).
    #[default]
    All,
    /// Cache only the listed columns.
    Include(Vec<String>),
    /// Cache every column except the listed ones.
    Exclude(Vec<String>),
}

impl ColumnCacheSpec {
    /// Resolve this spec against a table's full declared column list.
    pub fn resolve(&self, declared: &[String]) -> Vec<String> {
        match self {
            ColumnCacheSpec::All => declared.to_vec(),
            ColumnCacheSpec::Include(cols) => {
                declared.iter().filter(|c| cols.contains(c)).cloned().collect()
            }
            ColumnCacheSpec::Exclude(cols) => {
                declared.iter().filter(|c| !cols.contains(c)).cloned().collect()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig { size: 5 }
    }
}

/// Engine-wide configuration, corresponding to the `filename`/`pool`/`minInterval`/
/// `checkConditionWhenQueued`/`columnCache` options in §6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub filename: PathBuf,
    #[serde(default)]
    pub pool: Option<PoolConfig>,
    #[serde(default)]
    pub min_interval_ms: u64,
    #[serde(default)]
    pub check_condition_when_queued: bool,
    #[serde(default)]
    pub column_cache: HashMap<String, ColumnCacheSpec>,
}

impl Settings {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Settings {
            filename: filename.into(),
            pool: None,
            min_interval_ms: 0,
            check_condition_when_queued: false,
            column_cache: HashMap::new(),
        }
    }

    /// Path of the WAL file companion to `filename`, per §6 (`<filename>-wal`).
    pub fn wal_path(&self) -> PathBuf {
        let mut s = self.filename.clone().into_os_string();
        s.push("-wal");
        PathBuf::from(s)
    }

    pub fn column_cache_for(&self, table: &str) -> ColumnCacheSpec {
        self.column_cache.get(table).cloned().unwrap_or_default()
    }

    /// Parse settings from a TOML document already read into memory.
    pub fn from_toml(document: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(document)
    }

    /// Load settings from a TOML file on disk, following the teacher's `common::config` loader.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&document).map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wal_path_appends_suffix() {
        let s = Settings::new("/tmp/app.db");
        assert_eq!(s.wal_path(), PathBuf::from("/tmp/app.db-wal"));
    }

    #[test]
    fn column_cache_resolves_include() {
        let spec = ColumnCacheSpec::Include(vec!["id".to_string()]);
        let resolved = spec.resolve(&["id".to_string(), "password".to_string()]);
        assert_eq!(resolved, vec!["id".to_string()]);
    }

    #[test]
    fn column_cache_resolves_exclude() {
        let spec = ColumnCacheSpec::Exclude(vec!["password".to_string()]);
        let resolved = spec.resolve(&["id".to_string(), "password".to_string()]);
        assert_eq!(resolved, vec!["id".to_string()]);
    }

    #[test]
    fn from_toml_applies_defaults_for_missing_fields() {
        let settings = Settings::from_toml(r#"filename = "app.db""#).unwrap();
        assert_eq!(settings.filename, PathBuf::from("app.db"));
        assert_eq!(settings.pool, None);
        assert_eq!(settings.min_interval_ms, 0);
        assert!(!settings.check_condition_when_queued);
        assert!(settings.column_cache.is_empty());
    }

    #[test]
    fn from_toml_reads_every_field() {
        let document = r#"
            filename = "app.db"
            minInterval = 250
            checkConditionWhenQueued = true

            [pool]
            size = 8
        "#;
        let settings = Settings::from_toml(document).unwrap();
        assert_eq!(settings.min_interval_ms, 250);
        assert!(settings.check_condition_when_queued);
        assert_eq!(settings.pool, Some(PoolConfig { size: 8 }));
    }

    #[test]
    fn from_path_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, r#"filename = "app.db""#).unwrap();

        let settings = Settings::from_path(&path).unwrap();
        assert_eq!(settings.filename, PathBuf::from("app.db"));
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = Settings::from_path("/nonexistent/settings.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
