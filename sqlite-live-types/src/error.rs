use std::path::PathBuf;

use thiserror::Error;

/// Errors loading a [`crate::Settings`] from a TOML file, mirroring the teacher's
/// `common::config` loader.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse settings file {path}: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },
}
