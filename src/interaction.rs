//! Turns grid gestures (slot selection, event drag, event resize) into
//! reminder-store intents.

use chrono::{DateTime, Duration, Local};
use thiserror::Error;

use crate::calendar::{Reminder, ReminderId, Store, ValidationError};
use crate::form::Draft;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("no reminder with id {0}")]
    UnknownReminder(ReminderId),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A user-selected span of empty grid time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl SlotRange {
    /// Order the two ends of a selection made in either direction.
    pub fn spanning(a: DateTime<Local>, b: DateTime<Local>) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Interaction {
    default_duration: Duration,
    default_color: String,
}

impl Interaction {
    pub fn new(default_duration: Duration, default_color: impl Into<String>) -> Self {
        Self {
            default_duration,
            default_color: default_color.into(),
        }
    }

    /// Draft for a new reminder in `range`. The end is always `start` plus
    /// the default duration; the selection's own end is not used.
    pub fn on_slot_select(&self, range: SlotRange, id: ReminderId) -> Draft {
        Draft {
            id,
            title: String::new(),
            start: range.start,
            end: range
                .start
                .checked_add_signed(self.default_duration)
                .unwrap_or(range.start),
            color: self.default_color.clone(),
            description: String::new(),
            all_day: None,
        }
    }

    pub fn on_event_drag(
        &self,
        store: &Store,
        id: ReminderId,
        new_start: DateTime<Local>,
        new_end: DateTime<Local>,
    ) -> Result<Reminder, InteractionError> {
        retime(store, id, new_start, new_end)
    }

    pub fn on_event_resize(
        &self,
        store: &Store,
        id: ReminderId,
        new_start: DateTime<Local>,
        new_end: DateTime<Local>,
    ) -> Result<Reminder, InteractionError> {
        retime(store, id, new_start, new_end)
    }
}

fn retime(
    store: &Store,
    id: ReminderId,
    start: DateTime<Local>,
    end: DateTime<Local>,
) -> Result<Reminder, InteractionError> {
    let existing = store
        .get(id)
        .ok_or(InteractionError::UnknownReminder(id))?;
    Ok(existing.with_times(start, end)?)
}

/// Last mouse-down position, used to place popups near the click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerTracker {
    last_down: Option<(u16, u16)>,
}

impl PointerTracker {
    pub fn record_down(&mut self, column: u16, row: u16) {
        self.last_down = Some((column, row));
    }

    pub fn last_down(&self) -> Option<(u16, u16)> {
        self.last_down
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::calendar::storage::MemoryStorage;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn interaction() -> Interaction {
        Interaction::new(Duration::minutes(60), "#3B86FF")
    }

    fn store_with(reminders: &[(ReminderId, DateTime<Local>, i64)]) -> Store {
        let mut store = Store::load(Box::new(MemoryStorage::default()));
        for &(id, start, minutes) in reminders {
            let r = Reminder::new(id, format!("r{id}"), start, start + Duration::minutes(minutes), "red")
                .unwrap();
            store.add(r).unwrap();
        }
        store
    }

    #[test]
    fn slot_select_normalizes_end_to_default_duration() {
        let range = SlotRange::spanning(at(2024, 1, 1, 12, 0), at(2024, 1, 1, 10, 0));
        let draft = interaction().on_slot_select(range, 42);

        assert_eq!(draft.id, 42);
        assert_eq!(draft.start, at(2024, 1, 1, 10, 0));
        assert_eq!(draft.end, at(2024, 1, 1, 11, 0));
        assert_eq!(draft.color, "#3B86FF");
        assert!(draft.title.is_empty());
    }

    #[test]
    fn slot_select_never_overflows_the_end() {
        let start = at(2024, 1, 1, 10, 0);
        let draft = Interaction::new(Duration::MAX, "#3B86FF")
            .on_slot_select(SlotRange::spanning(start, start), 1);
        assert_eq!(draft.end, start);
    }

    #[test]
    fn drag_moves_both_bounds_of_the_matching_id_only() {
        let store = store_with(&[(4, at(2024, 1, 1, 9, 0), 60), (5, at(2024, 1, 1, 10, 0), 90)]);

        let moved = interaction()
            .on_event_drag(&store, 5, at(2024, 1, 2, 9, 0), at(2024, 1, 2, 10, 30))
            .unwrap();

        assert_eq!(moved.id(), 5);
        assert_eq!(moved.title(), "r5");
        assert_eq!(moved.duration(), Duration::minutes(90));
        assert_eq!(store.get(5).unwrap().start(), at(2024, 1, 1, 10, 0));
    }

    #[test]
    fn resize_may_change_duration() {
        let store = store_with(&[(1, at(2024, 1, 1, 9, 0), 60)]);
        let resized = interaction()
            .on_event_resize(&store, 1, at(2024, 1, 1, 9, 0), at(2024, 1, 1, 12, 0))
            .unwrap();
        assert_eq!(resized.duration(), Duration::hours(3));
    }

    #[test]
    fn rejects_unknown_ids_and_inverted_ranges() {
        let store = store_with(&[(1, at(2024, 1, 1, 9, 0), 60)]);
        assert_eq!(
            interaction()
                .on_event_drag(&store, 2, at(2024, 1, 1, 9, 0), at(2024, 1, 1, 10, 0))
                .unwrap_err(),
            InteractionError::UnknownReminder(2)
        );
        assert_eq!(
            interaction()
                .on_event_resize(&store, 1, at(2024, 1, 1, 9, 0), at(2024, 1, 1, 8, 0))
                .unwrap_err(),
            InteractionError::Invalid(ValidationError::EndBeforeStart)
        );
    }

    #[test]
    fn pointer_tracker_keeps_last_press() {
        let mut pointer = PointerTracker::default();
        assert_eq!(pointer.last_down(), None);
        pointer.record_down(3, 4);
        pointer.record_down(10, 2);
        assert_eq!(pointer.last_down(), Some((10, 2)));
    }
}
