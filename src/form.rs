//! Create/edit form state machine for a single reminder.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::calendar::reminder::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::calendar::{Reminder, ReminderId, Store, StoreError, ValidationError};
use crate::config::DurationPolicy;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const DATE_HINT: &str = "Enter the date as YYYY-MM-DD.";
const TIME_HINT: &str = "Enter the time as HH:MM.";

/// Unsaved reminder fields. Unlike [`Reminder`] this is freely mutable and
/// may be invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub id: ReminderId,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub color: String,
    pub description: String,
    pub all_day: Option<bool>,
}

impl Draft {
    pub fn from_reminder(reminder: &Reminder) -> Self {
        Self {
            id: reminder.id(),
            title: reminder.title().to_string(),
            start: reminder.start(),
            end: reminder.end(),
            color: reminder.color().to_string(),
            description: reminder.description().unwrap_or_default().to_string(),
            all_day: reminder.all_day(),
        }
    }

    pub fn to_reminder(&self) -> Result<Reminder, ValidationError> {
        let description = Some(self.description.clone()).filter(|d| !d.trim().is_empty());
        Ok(
            Reminder::new(self.id, self.title.trim(), self.start, self.end, self.color.clone())?
                .with_description(description)?
                .with_all_day(self.all_day),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { original: ReminderId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Date,
    Time,
    Color,
    Notes,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::Time,
            FormField::Time => FormField::Color,
            FormField::Color => FormField::Notes,
            FormField::Notes => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Notes,
            FormField::Date => FormField::Title,
            FormField::Time => FormField::Date,
            FormField::Color => FormField::Time,
            FormField::Notes => FormField::Color,
        }
    }
}

/// Everything an open form holds.
#[derive(Debug, Clone)]
pub struct FormDraft {
    pub mode: FormMode,
    pub draft: Draft,
    pub active_field: FormField,
    pub date_input: String,
    pub time_input: String,
    pub error: Option<String>,
    /// Terminal cell the popup should point at, if the form was opened
    /// from a mouse press.
    pub anchor: Option<(u16, u16)>,
}

impl FormDraft {
    fn new(mode: FormMode, draft: Draft, anchor: Option<(u16, u16)>) -> Self {
        Self {
            mode,
            date_input: draft.start.format(DATE_FORMAT).to_string(),
            time_input: draft.start.format(TIME_FORMAT).to_string(),
            draft,
            active_field: FormField::Title,
            error: None,
            anchor,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.draft.title,
            FormField::Date => &self.date_input,
            FormField::Time => &self.time_input,
            FormField::Color => &self.draft.color,
            FormField::Notes => &self.draft.description,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum FormState {
    #[default]
    Closed,
    Open(FormDraft),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Still open, usually with a validation message.
    Open,
    Saved(ReminderId),
    Discarded(ReminderId),
    Closed,
}

/// Controller for the single reminder modal.
#[derive(Debug, Clone)]
pub struct ReminderForm {
    state: FormState,
    policy: DurationPolicy,
}

impl ReminderForm {
    pub fn new(policy: DurationPolicy) -> Self {
        Self {
            state: FormState::Closed,
            policy,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FormState::Open(_))
    }

    pub fn current(&self) -> Option<&FormDraft> {
        match self.state {
            FormState::Open(ref form) => Some(form),
            FormState::Closed => None,
        }
    }

    fn current_mut(&mut self) -> Option<&mut FormDraft> {
        match self.state {
            FormState::Open(ref mut form) => Some(form),
            FormState::Closed => None,
        }
    }

    /// Open a create form; replaces any form already open.
    pub fn open_create(&mut self, draft: Draft, anchor: Option<(u16, u16)>) {
        tracing::debug!(id = draft.id, start = %draft.start, "open create form");
        self.state = FormState::Open(FormDraft::new(FormMode::Create, draft, anchor));
    }

    /// Open an edit form on a copy of `reminder`; replaces any form already open.
    pub fn open_edit(&mut self, reminder: &Reminder, anchor: Option<(u16, u16)>) {
        tracing::debug!(id = reminder.id(), "open edit form");
        let mode = FormMode::Edit {
            original: reminder.id(),
        };
        self.state = FormState::Open(FormDraft::new(mode, Draft::from_reminder(reminder), anchor));
    }

    /// Replace one field's text. Title and notes are cut to their limits;
    /// date and time are applied as soon as they parse.
    pub fn set_field(&mut self, field: FormField, value: &str) {
        let Some(form) = self.current_mut() else {
            return;
        };
        match field {
            FormField::Title => form.draft.title = value.chars().take(TITLE_MAX_CHARS).collect(),
            FormField::Notes => {
                form.draft.description = value.chars().take(DESCRIPTION_MAX_CHARS).collect()
            }
            FormField::Color => form.draft.color = value.to_string(),
            FormField::Date => {
                form.date_input = value.to_string();
                if let Some(date) = parse_date_input(value) {
                    self.move_start(|start| date.and_time(start.time()), false);
                }
            }
            FormField::Time => {
                form.time_input = value.to_string();
                if let Some(time) = parse_time_input(value) {
                    self.move_start(|start| start.date_naive().and_time(time), false);
                }
            }
        }
    }

    /// Move the draft to `date`, keeping its time of day.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.move_start(|start| date.and_time(start.time()), true);
    }

    /// Move the draft to `time` on its current date.
    pub fn set_time(&mut self, time: NaiveTime) {
        self.move_start(|start| start.date_naive().and_time(time), true);
    }

    /// Recompute `start` and let `end` follow it per the duration policy.
    /// `sync_inputs` rewrites the date/time text buffers; it is off while the
    /// user is typing into them.
    fn move_start(
        &mut self,
        compose: impl FnOnce(DateTime<Local>) -> NaiveDateTime,
        sync_inputs: bool,
    ) {
        let policy = self.policy;
        let Some(form) = self.current_mut() else {
            return;
        };

        let naive = compose(form.draft.start);
        let Some(start) = Local.from_local_datetime(&naive).earliest() else {
            form.error = Some(missing_local_time(naive));
            return;
        };

        let duration = (form.draft.end - form.draft.start).max(Duration::zero());
        form.draft.end = match policy {
            DurationPolicy::Preserve => start + duration,
            DurationPolicy::Instant => start,
        };
        form.draft.start = start;

        if sync_inputs {
            form.date_input = start.format(DATE_FORMAT).to_string();
            form.time_input = start.format(TIME_FORMAT).to_string();
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(form) = self.current() {
            let field = form.active_field;
            let mut value = form.value(field).to_string();
            value.push(c);
            self.set_field(field, &value);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(form) = self.current() {
            let field = form.active_field;
            let mut value = form.value(field).to_string();
            value.pop();
            self.set_field(field, &value);
        }
    }

    pub fn next_field(&mut self) {
        if let Some(form) = self.current_mut() {
            form.active_field = form.active_field.next();
        }
    }

    pub fn prev_field(&mut self) {
        if let Some(form) = self.current_mut() {
            form.active_field = form.active_field.prev();
        }
    }

    /// Validate and save. Invalid input keeps the form open with a message
    /// and leaves `store` untouched.
    pub fn confirm(&mut self, store: &mut Store) -> Result<FormOutcome, StoreError> {
        let Some(form) = self.current_mut() else {
            return Ok(FormOutcome::Closed);
        };

        let reminder = match validate(form) {
            Ok(reminder) => reminder,
            Err(message) => {
                tracing::debug!(%message, "form rejected");
                form.error = Some(message);
                return Ok(FormOutcome::Open);
            }
        };

        let id = reminder.id();
        let saved = match form.mode {
            FormMode::Create => store.add(reminder),
            FormMode::Edit { original } => store.update(original, reminder),
        };
        if let Err(e) = saved {
            form.error = Some(e.to_string());
            return Err(e);
        }

        self.state = FormState::Closed;
        Ok(FormOutcome::Saved(id))
    }

    /// Edit mode only: delete the reminder being edited and close, ignoring
    /// the draft. Does nothing for a create form.
    pub fn discard(&mut self, store: &mut Store) -> Result<FormOutcome, StoreError> {
        let original = match self.current() {
            Some(FormDraft {
                mode: FormMode::Edit { original },
                ..
            }) => *original,
            Some(_) => return Ok(FormOutcome::Open),
            None => return Ok(FormOutcome::Closed),
        };

        self.state = FormState::Closed;
        store.remove(original)?;
        Ok(FormOutcome::Discarded(original))
    }

    /// Close without saving, whatever was edited.
    pub fn cancel(&mut self) -> FormOutcome {
        self.state = FormState::Closed;
        FormOutcome::Closed
    }
}

/// Full `YYYY-MM-DD` only; chrono alone would accept partial input like `2024-1-5`.
fn parse_date_input(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Full `HH:MM` only.
fn parse_time_input(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if value.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

fn validate(form: &FormDraft) -> Result<Reminder, String> {
    if form.draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle.to_string());
    }
    let Some(date) = parse_date_input(&form.date_input) else {
        return Err(DATE_HINT.to_string());
    };
    let Some(time) = parse_time_input(&form.time_input) else {
        return Err(TIME_HINT.to_string());
    };
    // A well-formed date and time can still fall into a DST gap.
    let naive = date.and_time(time);
    if Local.from_local_datetime(&naive).earliest().is_none() {
        return Err(missing_local_time(naive));
    }

    let start = form.draft.start;
    if date != start.date_naive() {
        return Err(DATE_HINT.to_string());
    }
    if time.hour() != start.hour() || time.minute() != start.minute() {
        return Err(TIME_HINT.to_string());
    }
    form.draft.to_reminder().map_err(|e| e.to_string())
}

fn missing_local_time(naive: NaiveDateTime) -> String {
    format!("{} does not exist in the local time zone.", naive.format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::storage::MemoryStorage;
    use crate::interaction::{Interaction, SlotRange};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn store() -> (Store, MemoryStorage) {
        let storage = MemoryStorage::default();
        (Store::load(Box::new(storage.clone())), storage)
    }

    fn slot_draft(store: &Store, start: DateTime<Local>, end: DateTime<Local>) -> Draft {
        Interaction::new(Duration::minutes(60), "#3B86FF")
            .on_slot_select(SlotRange::spanning(start, end), store.next_id())
    }

    fn seeded(store: &mut Store, id: ReminderId, start: DateTime<Local>) -> Reminder {
        let r = Reminder::new(id, format!("r{id}"), start, start + Duration::minutes(30), "red").unwrap();
        store.add(r.clone()).unwrap();
        r
    }

    #[test]
    fn empty_title_keeps_form_open_and_store_unchanged() {
        let (mut store, storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 12, 0)), None);

        let outcome = form.confirm(&mut store).unwrap();

        assert_eq!(outcome, FormOutcome::Open);
        assert!(form.is_open());
        assert_eq!(
            form.current().unwrap().error.as_deref(),
            Some("Event title is required.")
        );
        assert!(store.is_empty());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn create_from_two_hour_slot_saves_one_hour_reminder() {
        let (mut store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 12, 0)), None);

        for c in "Meeting".chars() {
            form.input_char(c);
        }
        let outcome = form.confirm(&mut store).unwrap();

        assert_eq!(outcome, FormOutcome::Saved(1));
        assert!(!form.is_open());
        let saved = store.get(1).unwrap();
        assert_eq!(saved.title(), "Meeting");
        assert_eq!(saved.start(), at(2024, 1, 1, 10, 0));
        assert_eq!(saved.end(), at(2024, 1, 1, 11, 0));
    }

    /// First local wall-clock hour of 2024 skipped by a DST transition.
    fn skipped_local_hour() -> Option<NaiveDateTime> {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1)?.and_hms_opt(0, 30, 0)?;
        (0..366 * 24)
            .map(|h| first + Duration::hours(h))
            .find(|naive| Local.from_local_datetime(naive).earliest().is_none())
    }

    #[test]
    fn typed_time_in_a_dst_gap_keeps_the_gap_message() {
        // Zones without DST have nothing to check.
        let Some(gap) = skipped_local_hour() else {
            return;
        };
        let (mut store, storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)), None);

        form.set_field(FormField::Title, "Standup");
        form.set_field(FormField::Date, &gap.format("%Y-%m-%d").to_string());
        form.set_field(FormField::Time, &gap.format("%H:%M").to_string());
        let outcome = form.confirm(&mut store).unwrap();

        assert_eq!(outcome, FormOutcome::Open);
        let error = form.current().unwrap().error.clone().unwrap();
        assert!(error.contains("does not exist in the local time zone"), "{error}");
        assert!(store.is_empty());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn set_field_truncates_and_leaves_other_fields_alone() {
        let (store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        let draft = slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0));
        form.open_create(draft.clone(), None);

        form.set_field(FormField::Title, &"t".repeat(50));
        form.set_field(FormField::Notes, &"n".repeat(150));
        form.set_field(FormField::Color, "not-a-color");

        let open = form.current().unwrap();
        assert_eq!(open.draft.title.chars().count(), TITLE_MAX_CHARS);
        assert_eq!(open.draft.description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert_eq!(open.draft.color, "not-a-color");
        assert_eq!(open.draft.start, draft.start);
        assert_eq!(open.draft.end, draft.end);
    }

    #[test]
    fn set_date_keeps_time_and_preserves_duration() {
        let (store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 15), at(2024, 1, 1, 10, 15)), None);

        form.set_date(NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());

        let open = form.current().unwrap();
        assert_eq!(open.draft.start, at(2024, 2, 3, 10, 15));
        assert_eq!(open.draft.end, at(2024, 2, 3, 11, 15));
        assert_eq!(open.date_input, "2024-02-03");
    }

    #[test]
    fn set_time_keeps_date_and_instant_policy_collapses_end() {
        let (store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Instant);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)), None);

        form.set_time(NaiveTime::from_hms_opt(14, 45, 0).unwrap());

        let open = form.current().unwrap();
        assert_eq!(open.draft.start, at(2024, 1, 1, 14, 45));
        assert_eq!(open.draft.end, open.draft.start);
        assert_eq!(open.time_input, "14:45");
    }

    #[test]
    fn typed_time_applies_once_it_parses() {
        let (store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)), None);
        form.next_field();
        form.next_field();
        assert_eq!(form.current().unwrap().active_field, FormField::Time);

        for _ in 0..5 {
            form.backspace();
        }
        for c in "08:3".chars() {
            form.input_char(c);
        }
        assert_eq!(form.current().unwrap().draft.start, at(2024, 1, 1, 10, 0));
        form.input_char('0');
        assert_eq!(form.current().unwrap().draft.start, at(2024, 1, 1, 8, 30));
    }

    #[test]
    fn unparseable_time_blocks_confirm() {
        let (mut store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)), None);
        form.set_field(FormField::Title, "x");
        form.set_field(FormField::Time, "25:99");

        assert_eq!(form.confirm(&mut store).unwrap(), FormOutcome::Open);
        assert_eq!(form.current().unwrap().error.as_deref(), Some("Enter the time as HH:MM."));
        assert!(store.is_empty());
    }

    #[test]
    fn edit_confirm_replaces_by_id() {
        let (mut store, _storage) = store();
        let a = seeded(&mut store, 1, at(2024, 1, 1, 9, 0));
        let b = seeded(&mut store, 2, at(2024, 1, 1, 10, 0));

        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_edit(&b, None);
        form.set_field(FormField::Title, "renamed");
        form.set_field(FormField::Notes, "bring slides");
        assert_eq!(form.confirm(&mut store).unwrap(), FormOutcome::Saved(2));

        assert_eq!(store.get(1), Some(&a));
        let edited = store.get(2).unwrap();
        assert_eq!(edited.title(), "renamed");
        assert_eq!(edited.description(), Some("bring slides"));
        assert_eq!(edited.start(), b.start());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn discard_removes_the_edited_reminder() {
        let (mut store, _storage) = store();
        seeded(&mut store, 1, at(2024, 1, 1, 9, 0));
        let b = seeded(&mut store, 2, at(2024, 1, 1, 10, 0));
        let before = store.len();

        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_edit(&b, None);
        form.set_field(FormField::Title, "ignored");

        assert_eq!(form.discard(&mut store).unwrap(), FormOutcome::Discarded(2));
        assert!(!form.is_open());
        assert_eq!(store.len(), before - 1);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn discard_on_create_form_is_a_no_op() {
        let (mut store, storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_create(slot_draft(&store, at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)), None);

        assert_eq!(form.discard(&mut store).unwrap(), FormOutcome::Open);
        assert!(form.is_open());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn cancel_never_mutates_the_store() {
        let (mut store, storage) = store();
        let original = seeded(&mut store, 1, at(2024, 1, 1, 9, 0));
        let writes = storage.writes();

        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.open_edit(&original, Some((4, 2)));
        form.set_field(FormField::Title, "changed");
        form.set_field(FormField::Notes, "changed");
        form.set_field(FormField::Color, "#000000");
        form.set_date(NaiveDate::from_ymd_opt(2030, 5, 5).unwrap());
        form.set_time(NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert_eq!(form.cancel(), FormOutcome::Closed);

        assert_eq!(store.get(1), Some(&original));
        assert_eq!(storage.writes(), writes);
    }

    #[test]
    fn edits_are_ignored_while_closed() {
        let (mut store, _storage) = store();
        let mut form = ReminderForm::new(DurationPolicy::Preserve);
        form.input_char('x');
        form.set_field(FormField::Title, "x");
        assert_eq!(form.confirm(&mut store).unwrap(), FormOutcome::Closed);
        assert!(!form.is_open());
    }
}
