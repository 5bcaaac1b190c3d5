//! Retention settings
//!
//! # Example
//!
//! ```toml
//! [retention]
//! notify_before = true
//! interval_hours = 24
//! page_size = 1000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub retention: RetentionSettings,
}

/// Runtime options for retention jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSettings {
    /// Warn owners one day before their files are disposed of.
    /// Accepts `true`/`false` or `"yes"`/`"no"`.
    /// Default: false
    #[serde(default, deserialize_with = "yes_no")]
    pub notify_before: bool,

    /// How often each retention job runs (in hours).
    /// Default: 24 (once per day)
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Number of tagged object ids fetched per page.
    /// Default: 1000
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            notify_before: false,
            interval_hours: default_interval_hours(),
            page_size: default_page_size(),
        }
    }
}

fn default_interval_hours() -> u64 {
    24
}

fn default_page_size() -> usize {
    crate::DEFAULT_PAGE_SIZE
}

fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected yes or no, got '{}'",
                other
            ))),
        },
    }
}

impl RetentionSettings {
    /// Interval between two runs of the same job
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 60 * 60)
    }

    /// Check that values are within their valid ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=8760).contains(&self.interval_hours) {
            return Err(ConfigError::Invalid {
                key: "retention.interval_hours",
                reason: format!("{} is outside 1-8760", self.interval_hours),
            });
        }

        if !(1..=100_000).contains(&self.page_size) {
            return Err(ConfigError::Invalid {
                key: "retention.page_size",
                reason: format!("{} is outside 1-100000", self.page_size),
            });
        }

        Ok(())
    }

    /// Load settings from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file: SettingsFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        file.retention.validate()?;
        Ok(file.retention)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let file = SettingsFile {
            retention: self.clone(),
        };
        let contents = toml::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Default settings location: `<config dir>/retention/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("retention").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Annotated example settings file
pub fn example_config() -> &'static str {
    r#"# Retention settings

[retention]
# Warn file owners one day before their files are disposed of
notify_before = false

# How often each retention job runs (1-8760 hours)
interval_hours = 24

# Tagged files fetched per page (1-100000)
page_size = 1000
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = RetentionSettings::default();
        assert!(!settings.notify_before);
        assert_eq!(settings.interval(), Duration::from_secs(86_400));
        assert_eq!(settings.page_size, 1000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_notify_before_accepts_yes_no() {
        let file: SettingsFile = toml::from_str("[retention]\nnotify_before = \"yes\"\n").unwrap();
        assert!(file.retention.notify_before);

        let file: SettingsFile = toml::from_str("[retention]\nnotify_before = \"no\"\n").unwrap();
        assert!(!file.retention.notify_before);

        let file: SettingsFile = toml::from_str("[retention]\nnotify_before = true\n").unwrap();
        assert!(file.retention.notify_before);

        assert!(toml::from_str::<SettingsFile>("[retention]\nnotify_before = \"maybe\"\n").is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let file: SettingsFile = toml::from_str(example_config()).unwrap();
        assert_eq!(file.retention, RetentionSettings::default());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = RetentionSettings::load(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, RetentionSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let settings = RetentionSettings {
            notify_before: true,
            interval_hours: 12,
            page_size: 250,
        };
        settings.save(&path).unwrap();

        assert_eq!(RetentionSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_rejects_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[retention]\npage_size = 0\n").unwrap();

        let err = RetentionSettings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "retention.page_size", .. }));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[retention]\nnotify = true\n").unwrap();

        assert!(matches!(
            RetentionSettings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
