use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TITLE_MAX_CHARS: usize = 30;
pub const DESCRIPTION_MAX_CHARS: usize = 100;

pub type ReminderId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Event title is required.")]
    EmptyTitle,

    #[error("Event title is limited to {} characters.", TITLE_MAX_CHARS)]
    TitleTooLong,

    #[error("Notes are limited to {} characters.", DESCRIPTION_MAX_CHARS)]
    DescriptionTooLong,

    #[error("End time must not be before start time.")]
    EndBeforeStart,
}

/// A single calendar reminder.
///
/// Values are immutable: every edit goes through one of the `with_*`
/// builders, which re-validate and hand back a new value carrying the
/// same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    title: String,
    #[serde(with = "iso8601")]
    start: DateTime<Local>,
    #[serde(with = "iso8601")]
    end: DateTime<Local>,
    color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all_day: Option<bool>,
    id: ReminderId,
}

impl Reminder {
    pub fn new(
        id: ReminderId,
        title: impl Into<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
        color: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let reminder = Self {
            title: title.into(),
            start,
            end,
            color: color.into(),
            description: None,
            all_day: None,
            id,
        };
        reminder.validate()?;
        Ok(reminder)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }
        if let Some(ref desc) = self.description {
            if desc.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(ValidationError::DescriptionTooLong);
            }
        }
        if self.end < self.start {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }

    pub fn id(&self) -> ReminderId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day.unwrap_or(false)
    }

    pub fn all_day(&self) -> Option<bool> {
        self.all_day
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn with_times(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Self, ValidationError> {
        let next = Self {
            start,
            end,
            ..self.clone()
        };
        next.validate()?;
        Ok(next)
    }

    pub fn with_description(
        self,
        description: Option<String>,
    ) -> Result<Self, ValidationError> {
        let next = Self {
            description: description.filter(|d| !d.is_empty()),
            ..self
        };
        next.validate()?;
        Ok(next)
    }

    pub fn with_all_day(self, all_day: Option<bool>) -> Self {
        Self { all_day, ..self }
    }

    /// True if any part of the reminder falls on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        let first = self.start.date_naive();
        let last = if self.end > self.start && self.end.time() == chrono::NaiveTime::MIN {
            // Ends exactly at midnight: the following day is not touched.
            self.end.date_naive().pred_opt().unwrap_or(first)
        } else {
            self.end.date_naive()
        };
        first <= date && date <= last.max(first)
    }

    pub fn overlaps(&self, from: DateTime<Local>, to: DateTime<Local>) -> bool {
        if self.start == self.end {
            return from <= self.start && self.start < to;
        }
        self.start < to && from < self.end
    }

    pub fn time_display(&self) -> String {
        if self.is_all_day() {
            "All day".to_string()
        } else if self.start == self.end {
            self.start.format("%H:%M").to_string()
        } else {
            format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
        }
    }
}

/// Timestamps are written as UTC RFC 3339 strings with just enough
/// fractional digits to reproduce the instant exactly.
mod iso8601 {
    use chrono::{DateTime, Local, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let utc = value.with_timezone(&Utc);
        serializer.serialize_str(&utc.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn rejects_empty_title() {
        let err = Reminder::new(1, "  ", at(2024, 1, 1, 10, 0), at(2024, 1, 1, 11, 0), "#fff")
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
        assert_eq!(err.to_string(), "Event title is required.");
    }

    #[test]
    fn title_limit_counts_chars_not_bytes() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        assert!(Reminder::new(1, title, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 11, 0), "").is_ok());

        let title = "x".repeat(TITLE_MAX_CHARS + 1);
        let err = Reminder::new(1, title, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 11, 0), "")
            .unwrap_err();
        assert_eq!(err, ValidationError::TitleTooLong);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = Reminder::new(1, "a", at(2024, 1, 1, 11, 0), at(2024, 1, 1, 10, 0), "")
            .unwrap_err();
        assert_eq!(err, ValidationError::EndBeforeStart);
    }

    #[test]
    fn with_times_keeps_identity_and_leaves_original_untouched() {
        let original =
            Reminder::new(5, "Standup", at(2024, 1, 1, 9, 0), at(2024, 1, 1, 9, 30), "red").unwrap();
        let moved = original
            .with_times(at(2024, 1, 2, 9, 0), at(2024, 1, 2, 9, 30))
            .unwrap();

        assert_eq!(moved.id(), 5);
        assert_eq!(moved.title(), "Standup");
        assert_eq!(original.start(), at(2024, 1, 1, 9, 0));
        assert_eq!(moved.start(), at(2024, 1, 2, 9, 0));
    }

    #[test]
    fn description_is_limited() {
        let base = Reminder::new(1, "a", at(2024, 1, 1, 9, 0), at(2024, 1, 1, 9, 0), "").unwrap();
        let err = base
            .clone()
            .with_description(Some("n".repeat(DESCRIPTION_MAX_CHARS + 1)))
            .unwrap_err();
        assert_eq!(err, ValidationError::DescriptionTooLong);

        let empty = base.with_description(Some(String::new())).unwrap();
        assert_eq!(empty.description(), None);
    }

    #[test]
    fn serializes_flat_camel_case_record() {
        let reminder = Reminder::new(7, "Dentist", at(2024, 3, 4, 15, 0), at(2024, 3, 4, 16, 0), "#3B86FF")
            .unwrap()
            .with_all_day(Some(false));
        let value = serde_json::to_value(&reminder).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["title"], "Dentist");
        assert_eq!(value["color"], "#3B86FF");
        assert_eq!(value["allDay"], false);
        assert!(value.get("description").is_none());
        assert!(value["start"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn timestamps_round_trip_exactly() {
        let start = Local.timestamp_opt(1_704_103_200, 123_456_789).unwrap();
        let reminder = Reminder::new(1, "precise", start, start + Duration::minutes(45), "").unwrap();

        let json = serde_json::to_string(&reminder).unwrap();
        let back: Reminder = serde_json::from_str(&json).unwrap();

        assert_eq!(back.start(), reminder.start());
        assert_eq!(back.end(), reminder.end());
        assert_eq!(back, reminder);
    }

    #[test]
    fn accepts_millisecond_utc_timestamps() {
        let json = r##"{"title":"x","start":"2024-01-01T10:00:00.000Z","end":"2024-01-01T11:00:00.000Z","color":"#add8e6","id":3}"##;
        let reminder: Reminder = serde_json::from_str(json).unwrap();
        assert_eq!(reminder.duration(), Duration::hours(1));
        assert_eq!(reminder.description(), None);
        assert_eq!(reminder.all_day(), None);
    }

    #[test]
    fn occurs_on_spans_days_but_not_midnight_end() {
        let overnight =
            Reminder::new(1, "trip", at(2024, 1, 1, 22, 0), at(2024, 1, 3, 0, 0), "").unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert!(overnight.occurs_on(d(1)));
        assert!(overnight.occurs_on(d(2)));
        assert!(!overnight.occurs_on(d(3)));
    }
}
