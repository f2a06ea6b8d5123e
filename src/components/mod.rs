pub mod agenda_view;
pub mod day_view;
pub mod month_view;
pub mod reminder_form;
pub mod status_bar;
pub mod week_view;

pub use agenda_view::AgendaView;
pub use day_view::DayView;
pub use month_view::MonthView;
pub use reminder_form::ReminderForm;
pub use status_bar::StatusBar;
pub use week_view::{GridState, WeekView};
