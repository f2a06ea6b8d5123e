use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

use crate::theme::ThemeConfig;

const APP_DIR: &str = "reminder-tui";
const DEFAULT_DURATION_MINUTES: i64 = 60;
/// One week.
const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

/// How the end of a draft follows its start when the date or time field
/// is edited in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Keep the draft's previous duration.
    #[default]
    Preserve,
    /// Collapse the draft to a single instant (`end == start`).
    Instant,
}

/// Settings from `~/.config/reminder-tui/config.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    pub default_duration_minutes: i64,
    pub slot_minutes: u32,
    pub default_color: String,
    pub duration_policy: DurationPolicy,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub agenda_days: i64,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "info".to_string(),
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            slot_minutes: 30,
            default_color: "#3B86FF".to_string(),
            duration_policy: DurationPolicy::Preserve,
            day_start_hour: 6,
            day_end_hour: 23,
            agenda_days: 30,
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validated()
    }

    fn validated(mut self) -> Result<Self> {
        if !(0..=MAX_DURATION_MINUTES).contains(&self.default_duration_minutes) {
            return Err(eyre!(
                "default_duration_minutes must be between 0 and {MAX_DURATION_MINUTES}"
            ));
        }
        if self.slot_minutes == 0 || 24 * 60 % self.slot_minutes != 0 {
            return Err(eyre!("slot_minutes must divide a day evenly"));
        }
        if self.day_end_hour > 24 || self.day_start_hour >= self.day_end_hour {
            return Err(eyre!("day_start_hour must be before day_end_hour (max 24)"));
        }
        if (self.day_end_hour - self.day_start_hour) * 60 < self.slot_minutes {
            return Err(eyre!("slot_minutes must fit between day_start_hour and day_end_hour"));
        }
        self.agenda_days = self.agenda_days.max(1);
        Ok(self)
    }

    /// Where reminders, navigation state and the log file live.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
    }

    /// Length of a reminder created from a slot. Out-of-range values fall
    /// back to the built-in default.
    pub fn default_duration(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.default_duration_minutes)
            .filter(|d| *d >= chrono::Duration::zero())
            .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_DURATION_MINUTES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.default_duration_minutes, 60);
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.default_color, "#3B86FF");
        assert_eq!(config.duration_policy, DurationPolicy::Preserve);
        assert_eq!(config.agenda_days, 30);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = Config::parse(
            r#"
            duration_policy = "instant"
            slot_minutes = 15
            data_dir = "/tmp/reminders"

            [theme]
            preset = "nord"
            "#,
        )
        .unwrap();
        assert_eq!(config.duration_policy, DurationPolicy::Instant);
        assert_eq!(config.slot_minutes, 15);
        assert_eq!(config.default_duration_minutes, 60);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/reminders"));
        assert_eq!(config.theme.preset.as_deref(), Some("nord"));
    }

    #[test]
    fn rejects_nonsense_values() {
        assert!(Config::parse("slot_minutes = 0").is_err());
        assert!(Config::parse("slot_minutes = 7").is_err());
        assert!(Config::parse("day_start_hour = 20\nday_end_hour = 8").is_err());
        assert!(Config::parse("duration_policy = \"sometimes\"").is_err());
        assert!(Config::parse("default_duration_minutes = -5").is_err());
        assert!(Config::parse("default_duration_minutes = 9000000000000000").is_err());
        assert!(Config::parse("default_duration_minutes = 10081").is_err());
        assert!(Config::parse("slot_minutes = 720\nday_start_hour = 6\nday_end_hour = 7").is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        let config = Config::parse("default_duration_minutes = 10080").unwrap();
        assert_eq!(config.default_duration(), chrono::Duration::weeks(1));

        let config = Config::parse("slot_minutes = 60\nday_start_hour = 6\nday_end_hour = 7").unwrap();
        assert_eq!(config.slot_minutes, 60);
    }

    #[test]
    fn unvalidated_duration_falls_back_to_default() {
        let config = Config {
            default_duration_minutes: i64::MAX,
            ..Config::default()
        };
        assert_eq!(config.default_duration(), chrono::Duration::hours(1));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn broken_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "slot_minutes = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:?}").contains("config.toml"));
    }
}
