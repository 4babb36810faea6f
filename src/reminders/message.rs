//! Reminder email rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::StudyBlock;

/// A rendered email ready for a transport.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

fn format_moment(value: &DateTime<Utc>) -> String {
    value.format("%A, %B %-d, %Y at %H:%M UTC").to_string()
}

fn plural_minutes(minutes: i64) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

pub fn render_reminder(block: &StudyBlock, to: &str, dashboard_url: Option<&str>) -> OutgoingEmail {
    let subject = format!(
        "Your study block starts at {}",
        block.start_time.format("%H:%M UTC")
    );

    let mut body = format!(
        "Hi,\n\n\
         Your quiet study block is about to begin.\n\n\
         Starts:   {}\n\
         Ends:     {}\n\
         Duration: {}\n\n\
         Find a quiet spot, silence notifications and get ready to focus.\n",
        format_moment(&block.start_time),
        format_moment(&block.end_time),
        plural_minutes(block.duration_minutes()),
    );

    if let Some(url) = dashboard_url {
        body.push_str(&format!("\nView your schedule: {url}\n"));
    }

    OutgoingEmail {
        to: to.to_string(),
        subject,
        body,
    }
}
