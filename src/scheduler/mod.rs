pub mod controller;
pub mod global;
pub mod state;

pub use controller::ReminderScheduler;
pub use global::{get, get_or_install};
pub use state::{SchedulerSnapshot, SchedulerState, SchedulerStatus};
