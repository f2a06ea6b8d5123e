use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use thiserror::Error;

use super::reminder::{Reminder, ReminderId};
use super::storage::{Storage, StorageError};

/// Storage key holding the whole serialized reminder list.
pub const EVENTS_KEY: &str = "events";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a reminder with id {0} already exists")]
    DuplicateId(ReminderId),

    #[error("no reminder with id {0}")]
    NotFound(ReminderId),

    #[error("replacement for reminder {expected} carries id {found}")]
    IdMismatch {
        expected: ReminderId,
        found: ReminderId,
    },
}

/// Ordered reminder collection mirrored to durable storage.
///
/// The in-memory list is authoritative for rendering; storage is only
/// read once, in [`Store::load`]. Every successful mutation rewrites the
/// entire list under [`EVENTS_KEY`]. A failed write leaves the in-memory
/// change in place and is parked until [`Store::take_write_error`] is
/// called; the next mutation or [`Store::flush`] writes everything again.
pub struct Store {
    reminders: Vec<Reminder>,
    storage: Box<dyn Storage>,
    write_error: Option<StorageError>,
    unsaved: bool,
}

impl Store {
    /// Hydrate from storage. Never fails: unreadable or corrupt data is
    /// logged and replaced by an empty list, invalid records are skipped.
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let reminders = match storage.get(EVENTS_KEY) {
            Ok(Some(raw)) => parse_reminders(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored reminders, starting empty");
                Vec::new()
            }
        };

        tracing::info!(count = reminders.len(), "reminders loaded");

        Self {
            reminders,
            storage,
            write_error: None,
            unsaved: false,
        }
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// One past the largest id, or the lowest unused id once the largest
    /// is `ReminderId::MAX`.
    pub fn next_id(&self) -> ReminderId {
        match self.reminders.iter().map(Reminder::id).max() {
            None => 1,
            Some(max) => max.checked_add(1).unwrap_or_else(|| self.lowest_free_id()),
        }
    }

    fn lowest_free_id(&self) -> ReminderId {
        let used: HashSet<ReminderId> = self.reminders.iter().map(Reminder::id).collect();
        (1..).find(|id| !used.contains(id)).unwrap_or(0)
    }

    /// Reminders touching `date`, earliest first.
    pub fn on_date(&self, date: NaiveDate) -> Vec<&Reminder> {
        let mut found: Vec<&Reminder> = self
            .reminders
            .iter()
            .filter(|r| r.occurs_on(date))
            .collect();
        found.sort_by_key(|r| (r.start(), r.id()));
        found
    }

    /// Reminders overlapping the half-open range `[from, to)`, earliest first.
    pub fn in_range(&self, from: DateTime<Local>, to: DateTime<Local>) -> Vec<&Reminder> {
        let mut found: Vec<&Reminder> = self
            .reminders
            .iter()
            .filter(|r| r.overlaps(from, to))
            .collect();
        found.sort_by_key(|r| (r.start(), r.id()));
        found
    }

    pub fn days_with_reminders(&self, year: i32, month: u32) -> HashSet<u32> {
        let mut days = HashSet::new();
        for r in &self.reminders {
            let mut date = r.start().date_naive();
            while r.occurs_on(date) {
                if date.year() == year && date.month() == month {
                    days.insert(date.day());
                }
                match date.succ_opt() {
                    Some(next) => date = next,
                    None => break,
                }
            }
        }
        days
    }

    /// Swap in a whole new collection and write it out.
    pub fn replace_all(&mut self, reminders: Vec<Reminder>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(reminders.len());
        for r in &reminders {
            if !seen.insert(r.id()) {
                return Err(StoreError::DuplicateId(r.id()));
            }
        }

        self.reminders = reminders;
        self.persist();
        Ok(())
    }

    pub fn add(&mut self, reminder: Reminder) -> Result<(), StoreError> {
        tracing::debug!(id = reminder.id(), title = reminder.title(), "add reminder");
        let mut next = self.reminders.clone();
        next.push(reminder);
        self.replace_all(next)
    }

    pub fn update(&mut self, id: ReminderId, reminder: Reminder) -> Result<(), StoreError> {
        if reminder.id() != id {
            return Err(StoreError::IdMismatch {
                expected: id,
                found: reminder.id(),
            });
        }
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!(id, start = %reminder.start(), end = %reminder.end(), "update reminder");
        let next = self
            .reminders
            .iter()
            .map(|r| if r.id() == id { reminder.clone() } else { r.clone() })
            .collect();
        self.replace_all(next)
    }

    pub fn remove(&mut self, id: ReminderId) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!(id, "remove reminder");
        let next = self
            .reminders
            .iter()
            .filter(|r| r.id() != id)
            .cloned()
            .collect();
        self.replace_all(next)
    }

    /// Write the current collection again, e.g. to retry after a failure.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.write_error = None;
        self.write()?;
        self.unsaved = false;
        Ok(())
    }

    /// Whether the last write failed and memory is ahead of storage.
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    /// The last write failure not yet shown to the user.
    pub fn take_write_error(&mut self) -> Option<StorageError> {
        self.write_error.take()
    }

    fn persist(&mut self) {
        match self.write() {
            Ok(()) => {
                self.write_error = None;
                self.unsaved = false;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to persist reminders");
                self.write_error = Some(e);
                self.unsaved = true;
            }
        }
    }

    fn write(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.reminders).map_err(|source| {
            StorageError::Encode {
                key: EVENTS_KEY.to_string(),
                source,
            }
        })?;
        self.storage.set(EVENTS_KEY, &json)
    }
}

fn parse_reminders(raw: &str) -> Vec<Reminder> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "stored reminders are corrupt, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut reminders = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let reminder: Reminder = match serde_json::from_value(record) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unreadable reminder record");
                continue;
            }
        };
        if let Err(e) = reminder.validate() {
            tracing::warn!(index, id = reminder.id(), error = %e, "skipping invalid reminder");
            continue;
        }
        if !seen.insert(reminder.id()) {
            tracing::warn!(index, id = reminder.id(), "skipping reminder with duplicate id");
            continue;
        }
        reminders.push(reminder);
    }

    reminders
}
