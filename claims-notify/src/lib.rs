pub mod lifecycle;
pub mod policy;
pub mod reminder;
pub mod service;
pub mod templates;

#[cfg(test)]
mod testing;

pub use policy::{due_reminders, DayWindow, DueOn, DueReminder};
pub use reminder::ScanSummary;
pub use service::{Clock, FanOutSummary, NotificationService};
pub use templates::{Rendered, Templates};
