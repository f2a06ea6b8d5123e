pub mod reminder;
pub mod storage;
pub mod store;

pub use reminder::{Reminder, ReminderId, ValidationError};
pub use storage::{FileStorage, Storage, StorageError};
pub use store::{Store, StoreError};
