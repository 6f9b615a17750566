//! Viewer configuration.
//!
//! [`ViewerConfig`] is plain data handed to [`ScanCoordinator::with_config`]. With the
//! `config` feature it can also be read from a TOML file:
//!
//! ```toml
//! cancel_wait_ms = 1500
//!
//! [default_options]
//! case_sensitive = false
//! whole_word = true
//! use_regex = false
//! ```
//!
//! [`ScanCoordinator::with_config`]: crate::search::ScanCoordinator::with_config

use crate::filter::FilterOptions;
use std::time::Duration;

/// Bound on waiting for a superseded scan to stop.
pub const DEFAULT_CANCEL_WAIT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Options the filter input starts with.
    pub default_options: FilterOptions,
    pub cancel_wait: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_options: FilterOptions::default(),
            cancel_wait: DEFAULT_CANCEL_WAIT,
        }
    }
}

#[cfg(feature = "config")]
mod file {
    use super::ViewerConfig;
    use crate::error::{LogsiftError, Result};
    use crate::filter::FilterOptions;
    use serde::Deserialize;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// On-disk layout; every field is optional.
    #[derive(Debug, Default, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct ConfigFile {
        #[serde(default)]
        default_options: Option<FilterOptions>,
        #[serde(default)]
        cancel_wait_ms: Option<u64>,
    }

    impl ViewerConfig {
        pub fn from_toml_str(source: &str) -> Result<Self> {
            let file: ConfigFile = toml::from_str(source)
                .map_err(|err| LogsiftError::config(format!("invalid TOML: {}", err)))?;

            let defaults = Self::default();
            Ok(Self {
                default_options: file.default_options.unwrap_or(defaults.default_options),
                cancel_wait: file
                    .cancel_wait_ms
                    .map_or(defaults.cancel_wait, Duration::from_millis),
            })
        }

        pub fn load(path: &Path) -> Result<Self> {
            let source = std::fs::read_to_string(path).map_err(|err| {
                LogsiftError::file_error(format!("cannot read {}", path.display()), err)
            })?;
            Self::from_toml_str(&source).map_err(|err| match err {
                LogsiftError::ConfigError { message } => {
                    LogsiftError::config(format!("{}: {}", path.display(), message))
                }
                other => other,
            })
        }

        /// `<config_dir>/logsift/config.toml`, if the platform has a config directory.
        pub fn default_path() -> Option<PathBuf> {
            dirs::config_dir().map(|dir| dir.join("logsift").join("config.toml"))
        }

        /// Load the default config file, falling back to defaults when it does not exist.
        pub fn load_or_default() -> Result<Self> {
            match Self::default_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => {
                    log::debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.cancel_wait, Duration::from_secs(3));
        assert_eq!(config.default_options, FilterOptions::default());
    }

    #[cfg(feature = "config")]
    mod file {
        use super::*;
        use crate::error::LogsiftError;
        use std::io::Write;

        #[test]
        fn test_from_toml_str_partial() {
            let config = ViewerConfig::from_toml_str("cancel_wait_ms = 250\n").unwrap();
            assert_eq!(config.cancel_wait, Duration::from_millis(250));
            assert_eq!(config.default_options, FilterOptions::default());
        }

        #[test]
        fn test_from_toml_str_options() {
            let config =
                ViewerConfig::from_toml_str("[default_options]\nwhole_word = true\n").unwrap();
            assert!(config.default_options.whole_word);
            assert!(!config.default_options.case_sensitive);
            assert_eq!(config.cancel_wait, DEFAULT_CANCEL_WAIT);
        }

        #[test]
        fn test_unknown_key_rejected() {
            let err = ViewerConfig::from_toml_str("colour = \"red\"\n").unwrap_err();
            assert!(matches!(err, LogsiftError::ConfigError { .. }));
        }

        #[test]
        fn test_load_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "cancel_wait_ms = 10").unwrap();
            writeln!(file, "[default_options]").unwrap();
            writeln!(file, "use_regex = true").unwrap();
            file.flush().unwrap();

            let config = ViewerConfig::load(file.path()).unwrap();
            assert_eq!(config.cancel_wait, Duration::from_millis(10));
            assert!(config.default_options.use_regex);
        }

        #[test]
        fn test_load_malformed_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "cancel_wait_ms = [").unwrap();
            file.flush().unwrap();

            let err = ViewerConfig::load(file.path()).unwrap_err();
            assert!(matches!(err, LogsiftError::ConfigError { .. }));
        }

        #[test]
        fn test_load_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = ViewerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
            assert!(matches!(err, LogsiftError::FileError { .. }));
        }
    }
}
