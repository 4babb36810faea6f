//! The process-wide scheduler.
//!
//! One reminder cadence per process: the first caller of [`get_or_install`]
//! builds the scheduler, everyone after that gets the same instance. Code
//! that wants an isolated scheduler (tests, embedding) constructs
//! [`ReminderScheduler`] directly instead.

use std::sync::OnceLock;

use anyhow::Result;

use super::controller::ReminderScheduler;

static SCHEDULER: OnceLock<ReminderScheduler> = OnceLock::new();

pub fn get_or_install<F>(build: F) -> Result<&'static ReminderScheduler>
where
    F: FnOnce() -> Result<ReminderScheduler>,
{
    if let Some(existing) = SCHEDULER.get() {
        return Ok(existing);
    }

    let scheduler = build()?;
    // A concurrent installer may have won the race; its instance is kept.
    Ok(SCHEDULER.get_or_init(|| scheduler))
}

pub fn get() -> Option<&'static ReminderScheduler> {
    SCHEDULER.get()
}
