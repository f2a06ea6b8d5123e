use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use thiserror::Error;

use crate::calendar::Storage;

/// Navigation-state key the active view is persisted under.
pub const VIEW_KEY: &str = "view";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    WorkWeek,
    Day,
    Agenda,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown calendar view {0:?}")]
pub struct UnknownView(pub String);

impl CalendarView {
    pub const ALL: [CalendarView; 5] = [
        CalendarView::Month,
        CalendarView::Week,
        CalendarView::WorkWeek,
        CalendarView::Day,
        CalendarView::Agenda,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::WorkWeek => "work_week",
            CalendarView::Day => "day",
            CalendarView::Agenda => "agenda",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CalendarView::Month => "Month",
            CalendarView::Week => "Week",
            CalendarView::WorkWeek => "Work Week",
            CalendarView::Day => "Day",
            CalendarView::Agenda => "Agenda",
        }
    }

    /// Resolve an external view parameter; absent or unknown values mean month.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::parse::<CalendarView>) {
            Some(Ok(view)) => view,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "falling back to month view");
                CalendarView::Month
            }
            None => CalendarView::Month,
        }
    }

    /// Whether the view lays out time slots (and so has a slot cursor).
    pub fn has_time_grid(self) -> bool {
        matches!(
            self,
            CalendarView::Week | CalendarView::WorkWeek | CalendarView::Day
        )
    }
}

impl FromStr for CalendarView {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalendarView::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Prev,
    Next,
    Today,
}

/// Active view and the date it is anchored on.
///
/// The view survives restarts through the navigation store; the date is
/// session-only.
pub struct ViewController {
    current_view: CalendarView,
    current_date: NaiveDate,
    agenda_days: i64,
    nav: Box<dyn Storage>,
}

impl ViewController {
    pub fn mount(nav: Box<dyn Storage>, today: NaiveDate, agenda_days: i64) -> Self {
        let param = match nav.get(VIEW_KEY) {
            Ok(raw) => raw.map(|raw| {
                serde_json::from_str::<String>(&raw).unwrap_or_else(|_| raw.trim().to_string())
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved view");
                None
            }
        };

        Self {
            current_view: CalendarView::from_param(param.as_deref()),
            current_date: today,
            agenda_days: agenda_days.max(1),
            nav,
        }
    }

    pub fn current_view(&self) -> CalendarView {
        self.current_view
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn agenda_days(&self) -> i64 {
        self.agenda_days
    }

    pub fn set_view(&mut self, view: CalendarView) {
        if view == self.current_view {
            return;
        }
        self.current_view = view;

        let value = serde_json::Value::String(view.as_str().to_string()).to_string();
        if let Err(e) = self.nav.set(VIEW_KEY, &value) {
            tracing::warn!(error = %e, view = view.as_str(), "could not save view");
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    /// Step one period of the active view, or jump to `today`.
    pub fn navigate(&mut self, action: Navigate, today: NaiveDate) {
        let date = self.current_date;
        self.current_date = match (action, self.current_view) {
            (Navigate::Today, _) => today,
            (Navigate::Prev, CalendarView::Month) => shift_month(date, -1),
            (Navigate::Next, CalendarView::Month) => shift_month(date, 1),
            (Navigate::Prev, CalendarView::Week | CalendarView::WorkWeek) => date - Duration::weeks(1),
            (Navigate::Next, CalendarView::Week | CalendarView::WorkWeek) => date + Duration::weeks(1),
            (Navigate::Prev, CalendarView::Day) => date.pred_opt().unwrap_or(date),
            (Navigate::Next, CalendarView::Day) => date.succ_opt().unwrap_or(date),
            (Navigate::Prev, CalendarView::Agenda) => date - Duration::days(self.agenda_days),
            (Navigate::Next, CalendarView::Agenda) => date + Duration::days(self.agenda_days),
        };
    }

    /// Sunday starting the week that contains the current date.
    pub fn week_start(&self) -> NaiveDate {
        week_start(self.current_date)
    }

    /// Days shown as columns by the time-grid views.
    pub fn visible_days(&self) -> Vec<NaiveDate> {
        match self.current_view {
            CalendarView::Week => (0..7).map(|i| self.week_start() + Duration::days(i)).collect(),
            CalendarView::WorkWeek => {
                let monday = self
                    .current_date
                    .week(Weekday::Mon)
                    .first_day();
                (0..5).map(|i| monday + Duration::days(i)).collect()
            }
            _ => vec![self.current_date],
        }
    }

    /// First day shown and the day after the last one.
    pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
        let date = self.current_date;
        match self.current_view {
            CalendarView::Month => {
                let first = date.with_day(1).unwrap_or(date);
                (first, shift_month(first, 1))
            }
            CalendarView::Agenda => (date, date + Duration::days(self.agenda_days)),
            _ => {
                let days = self.visible_days();
                let first = days.first().copied().unwrap_or(date);
                let last = days.last().copied().unwrap_or(date);
                (first, last + Duration::days(1))
            }
        }
    }
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Sun).first_day()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}

/// Move by whole months, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}
