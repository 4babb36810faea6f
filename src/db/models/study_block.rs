//! Study block data models.
//!
//! A block is a quiet-study interval owned by one user. The only field that
//! ever changes after creation is `reminder_sent`, and it only moves from
//! `false` to `true`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyBlock {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl StudyBlock {
    /// Length of the block in whole minutes, rounded to the nearest minute.
    pub fn duration_minutes(&self) -> i64 {
        let seconds = (self.end_time - self.start_time).num_seconds();
        (seconds as f64 / 60.0).round() as i64
    }
}

/// Input for creating a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudyBlock {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewStudyBlock {
    /// Checks the creation rules against `now`: a non-empty owner, a start
    /// strictly before the end, and a start strictly in the future.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.user_id.trim().is_empty() {
            bail!("user id must not be empty");
        }
        if self.start_time >= self.end_time {
            bail!("start time must be before end time");
        }
        if self.start_time <= now {
            bail!("start time must be in the future");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn block(start: DateTime<Utc>, end: DateTime<Utc>) -> StudyBlock {
        StudyBlock {
            id: "block-1".into(),
            user_id: "user-1".into(),
            start_time: start,
            end_time: end,
            reminder_sent: false,
            created_at: at(9, 0),
        }
    }

    #[test]
    fn duration_of_a_45_minute_block() {
        assert_eq!(block(at(10, 0), at(10, 45)).duration_minutes(), 45);
    }

    #[test]
    fn duration_rounds_to_nearest_minute() {
        let start = at(10, 0);
        assert_eq!(block(start, start + Duration::seconds(89)).duration_minutes(), 1);
        assert_eq!(block(start, start + Duration::seconds(90)).duration_minutes(), 2);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(block(at(10, 0), at(11, 0))).unwrap();
        assert_eq!(json["reminderSent"], false);
        assert_eq!(json["userId"], "user-1");
        assert!(json.get("startTime").is_some());
    }

    #[test]
    fn validation_rules() {
        let now = at(9, 0);
        let ok = NewStudyBlock {
            user_id: "user-1".into(),
            start_time: at(10, 0),
            end_time: at(11, 0),
        };
        assert!(ok.validate(now).is_ok());

        let inverted = NewStudyBlock {
            start_time: at(11, 0),
            end_time: at(10, 0),
            ..ok.clone()
        };
        assert!(inverted.validate(now).is_err());

        let empty = NewStudyBlock {
            start_time: at(10, 0),
            end_time: at(10, 0),
            ..ok.clone()
        };
        assert!(empty.validate(now).is_err());

        let started = NewStudyBlock {
            start_time: now,
            ..ok.clone()
        };
        assert!(started.validate(now).is_err());

        let anonymous = NewStudyBlock {
            user_id: "  ".into(),
            ..ok
        };
        assert!(anonymous.validate(now).is_err());
    }
}
