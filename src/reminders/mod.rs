pub mod mail;
pub mod message;
pub mod notifier;
pub mod store;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testing;

pub use mail::{HttpMailTransport, LogTransport, MailTransport};
pub use message::{render_reminder, OutgoingEmail};
pub use notifier::{EmailNotifier, Notifier};
pub use store::BlockStore;
pub use sweep::{ReminderSweep, SweepResult, DEFAULT_LOOKAHEAD_MINUTES};
