use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

use crate::calendar::{FileStorage, Reminder, ReminderId, Storage, Store};
use crate::config::Config;
use crate::form::{FormField, FormOutcome, ReminderForm};
use crate::interaction::{Interaction, PointerTracker, SlotRange};
use crate::view::{CalendarView, Navigate, ViewController};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

/// Hours and slot size of the day/week time grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    pub slot_minutes: u32,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
}

impl GridSettings {
    pub fn slot(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    pub fn first_slot(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.day_start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Start of the last slot shown.
    pub fn last_slot(&self) -> NaiveTime {
        let end_minutes = self.day_end_hour * 60 - self.slot_minutes;
        NaiveTime::from_hms_opt(end_minutes / 60, end_minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn slot_count(&self) -> usize {
        ((self.day_end_hour - self.day_start_hour) * 60 / self.slot_minutes) as usize
    }

    /// Start time of slot `index` (0 = first slot of the grid).
    pub fn slot_time(&self, index: usize) -> NaiveTime {
        let minutes = self.day_start_hour * 60 + index as u32 * self.slot_minutes;
        NaiveTime::from_hms_opt(minutes / 60 % 24, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn slot_index(&self, time: NaiveTime) -> usize {
        let minutes = time.hour() * 60 + time.minute();
        let offset = minutes.saturating_sub(self.day_start_hour * 60);
        ((offset / self.slot_minutes) as usize).min(self.slot_count().saturating_sub(1))
    }

    /// Round `time` down to a slot boundary inside the grid.
    pub fn snap(&self, time: NaiveTime) -> NaiveTime {
        self.slot_time(self.slot_index(time))
    }
}

impl From<&Config> for GridSettings {
    fn from(config: &Config) -> Self {
        Self {
            slot_minutes: config.slot_minutes,
            day_start_hour: config.day_start_hour,
            day_end_hour: config.day_end_hour,
        }
    }
}

pub struct App {
    pub running: bool,
    pub today: NaiveDate,
    pub views: ViewController,
    pub store: Store,
    pub form: ReminderForm,
    pub interaction: Interaction,
    pub pointer: PointerTracker,
    pub grid: GridSettings,
    /// Time of day of the slot cursor in the time-grid views.
    pub cursor: NaiveTime,
    /// Where a range selection started, if one is in progress.
    pub selection_anchor: Option<DateTime<Local>>,
    pub focused: Option<ReminderId>,
    pub show_help: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let storage = FileStorage::new(config.data_dir());
        tracing::info!(dir = %storage.dir().display(), "using data directory");
        Self::with_storage(
            config,
            Box::new(storage.clone()),
            Box::new(storage),
            Local::now().date_naive(),
        )
    }

    pub fn with_storage(
        config: &Config,
        reminders: Box<dyn Storage>,
        nav: Box<dyn Storage>,
        today: NaiveDate,
    ) -> Self {
        let grid = GridSettings::from(config);
        let cursor = NaiveTime::from_hms_opt(9, 0, 0).map_or(grid.first_slot(), |t| grid.snap(t));

        Self {
            running: true,
            today,
            views: ViewController::mount(nav, today, config.agenda_days),
            store: Store::load(reminders),
            form: ReminderForm::new(config.duration_policy),
            interaction: Interaction::new(config.default_duration(), config.default_color.clone()),
            pointer: PointerTracker::default(),
            grid,
            cursor,
            selection_anchor: None,
            focused: None,
            show_help: false,
            status_message: None,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.form.is_open() {
            InputMode::Form
        } else {
            InputMode::Normal
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.views.current_date()
    }

    pub fn view(&self) -> CalendarView {
        self.views.current_view()
    }

    pub fn tick(&mut self) {
        self.today = Local::now().date_naive();
    }

    // ── navigation ──

    pub fn set_view(&mut self, view: CalendarView) {
        self.views.set_view(view);
        self.retain_focus();
    }

    pub fn navigate(&mut self, action: Navigate) {
        self.views.navigate(action, self.today);
        self.retain_focus();
    }

    pub fn next_day(&mut self) {
        self.shift_date(Duration::days(1));
    }

    pub fn prev_day(&mut self) {
        self.shift_date(Duration::days(-1));
    }

    fn shift_date(&mut self, by: Duration) {
        self.views.set_date(self.selected_date() + by);
        self.retain_focus();
    }

    /// Move the cursor by `steps`: slots in the time grids, weeks in the
    /// month view, items in the agenda.
    pub fn move_cursor(&mut self, steps: i32) {
        match self.view() {
            CalendarView::Month => self.shift_date(Duration::weeks(i64::from(steps))),
            CalendarView::Agenda => {
                if steps > 0 {
                    self.focus_next();
                } else {
                    self.focus_prev();
                }
            }
            _ => {
                let index = self.grid.slot_index(self.cursor) as i64 + i64::from(steps);
                let last = self.grid.slot_count() as i64 - 1;
                self.cursor = self.grid.slot_time(index.clamp(0, last) as usize);
            }
        }
    }

    pub fn toggle_selection(&mut self) {
        self.selection_anchor = match self.selection_anchor {
            Some(_) => None,
            None => self.cursor_start(),
        };
    }

    /// Selected range for display, covering whole slots.
    pub fn selection(&self) -> Option<SlotRange> {
        let anchor = self.selection_anchor?;
        let cursor = self.cursor_start()?;
        let range = SlotRange::spanning(anchor, cursor);
        Some(SlotRange {
            start: range.start,
            end: range.end + self.grid.slot(),
        })
    }

    fn cursor_start(&self) -> Option<DateTime<Local>> {
        local(self.selected_date(), self.cursor)
    }

    // ── slot selection / reminder focus ──

    /// Open the create form for the selection, or the slot under the cursor.
    pub fn select_slot(&mut self) {
        let range = if self.view().has_time_grid() {
            match self.selection().or_else(|| {
                self.cursor_start().map(|start| SlotRange {
                    start,
                    end: start + self.grid.slot(),
                })
            }) {
                Some(range) => range,
                None => return,
            }
        } else {
            let date = self.selected_date();
            match (local(date, NaiveTime::MIN), date.succ_opt().and_then(|d| local(d, NaiveTime::MIN))) {
                (Some(start), Some(end)) => SlotRange { start, end },
                _ => return,
            }
        };

        let draft = self.interaction.on_slot_select(range, self.store.next_id());
        self.selection_anchor = None;
        self.form.open_create(draft, self.pointer.last_down());
    }

    /// Enter: edit the focused reminder, otherwise create in the selected slot.
    pub fn activate(&mut self) {
        match self.focused_reminder().cloned() {
            Some(reminder) => self.form.open_edit(&reminder, self.pointer.last_down()),
            None => self.select_slot(),
        }
    }

    pub fn focused_reminder(&self) -> Option<&Reminder> {
        self.focused.and_then(|id| self.store.get(id))
    }

    /// Reminders Tab cycles through: the agenda window, or the selected day.
    pub fn focus_candidates(&self) -> Vec<&Reminder> {
        if self.view() == CalendarView::Agenda {
            self.visible_reminders()
        } else {
            self.store.on_date(self.selected_date())
        }
    }

    /// Reminders overlapping the days the current view shows.
    pub fn visible_reminders(&self) -> Vec<&Reminder> {
        let (from, to) = self.views.visible_range();
        match (local(from, NaiveTime::MIN), local(to, NaiveTime::MIN)) {
            (Some(from), Some(to)) => self.store.in_range(from, to),
            _ => Vec::new(),
        }
    }

    pub fn focus_next(&mut self) {
        self.cycle_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.cycle_focus(-1);
    }

    fn cycle_focus(&mut self, step: isize) {
        let ids: Vec<ReminderId> = self.focus_candidates().iter().map(|r| r.id()).collect();
        if ids.is_empty() {
            self.focused = None;
            return;
        }
        let len = ids.len() as isize;
        let next = match self.focused.and_then(|id| ids.iter().position(|&c| c == id)) {
            Some(pos) => (pos as isize + step).rem_euclid(len),
            None if step > 0 => 0,
            None => len - 1,
        };
        self.focused = Some(ids[next as usize]);
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
        self.selection_anchor = None;
    }

    fn retain_focus(&mut self) {
        if let Some(id) = self.focused {
            if !self.focus_candidates().iter().any(|r| r.id() == id) {
                self.focused = None;
            }
        }
    }

    // ── drag / resize / delete ──

    /// Move the focused reminder by `by`, keeping its duration.
    pub fn drag_focused(&mut self, by: Duration) {
        let Some(reminder) = self.focused_reminder() else {
            self.status_message = Some("Tab to a reminder first".to_string());
            return;
        };
        let (id, start, end) = (reminder.id(), reminder.start() + by, reminder.end() + by);

        match self.interaction.on_event_drag(&self.store, id, start, end) {
            Ok(moved) => self.apply_retime(moved),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Move the focused reminder's end by `by`, never before its start.
    pub fn resize_focused(&mut self, by: Duration) {
        let Some(reminder) = self.focused_reminder() else {
            self.status_message = Some("Tab to a reminder first".to_string());
            return;
        };
        let (id, start) = (reminder.id(), reminder.start());
        let end = (reminder.end() + by).max(start);

        match self.interaction.on_event_resize(&self.store, id, start, end) {
            Ok(resized) => self.apply_retime(resized),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    fn apply_retime(&mut self, reminder: Reminder) {
        let (id, start) = (reminder.id(), reminder.start());
        if let Err(e) = self.store.update(id, reminder) {
            tracing::warn!(error = %e, "retime rejected");
            self.status_message = Some(e.to_string());
            return;
        }
        // Follow the reminder so it stays visible and focused.
        if self.view() != CalendarView::Agenda {
            self.views.set_date(start.date_naive());
        }
        if self.view().has_time_grid() {
            self.cursor = self.grid.snap(start.time());
        }
        self.check_write();
    }

    pub fn delete_focused(&mut self) {
        let Some(id) = self.focused else {
            self.status_message = Some("Tab to a reminder first".to_string());
            return;
        };
        match self.store.remove(id) {
            Ok(()) => {
                self.focused = None;
                self.status_message = Some("Reminder deleted".to_string());
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
        self.check_write();
    }

    // ── form ──

    pub fn submit_form(&mut self) {
        match self.form.confirm(&mut self.store) {
            Ok(FormOutcome::Saved(id)) => {
                self.focused = Some(id);
                self.status_message = Some("Reminder saved".to_string());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "save rejected"),
        }
        self.check_write();
    }

    pub fn discard_form(&mut self) {
        match self.form.discard(&mut self.store) {
            Ok(FormOutcome::Discarded(_)) => {
                self.focused = None;
                self.status_message = Some("Reminder discarded".to_string());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "discard failed");
                self.status_message = Some(e.to_string());
            }
        }
        self.check_write();
    }

    /// Up/Down in the form: step the date by a day or the time by a slot,
    /// or move between the other fields.
    pub fn form_adjust(&mut self, up: bool) {
        let Some(form) = self.form.current() else {
            return;
        };
        let (field, start) = (form.active_field, form.draft.start);
        let sign: i32 = if up { 1 } else { -1 };
        match field {
            FormField::Date => self.form.set_date(start.date_naive() + Duration::days(i64::from(sign))),
            FormField::Time => self.form.set_time(start.time() + self.grid.slot() * sign),
            _ if up => self.form.prev_field(),
            _ => self.form.next_field(),
        }
    }

    pub fn close_form(&mut self) {
        self.form.cancel();
    }

    pub fn record_pointer(&mut self, column: u16, row: u16) {
        self.pointer.record_down(column, row);
    }

    // ── persistence ──

    /// Retry writing the reminder file.
    pub fn save(&mut self) {
        match self.store.flush() {
            Ok(()) => self.status_message = Some("Reminders saved".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "manual save failed");
                self.status_message = Some(format!("Save failed: {e}"));
            }
        }
    }

    fn check_write(&mut self) {
        if let Some(e) = self.store.take_write_error() {
            self.status_message = Some(format!("Not saved: {e} (w to retry)"));
        }
    }
}

fn local(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&date.and_time(time)).earliest()
}
