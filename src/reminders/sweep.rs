//! One pass of "find blocks starting soon, notify owners, mark done".
//!
//! The reminder flag is the only thing that stops a later pass from mailing
//! the same block again, so a block is marked strictly after its email went
//! out. When the mark itself fails the email is already gone; that case is
//! reported but cannot be undone.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::db::StudyBlock;

use super::message::render_reminder;
use super::notifier::Notifier;
use super::store::BlockStore;

pub const DEFAULT_LOOKAHEAD_MINUTES: i64 = 10;

/// Outcome of a single sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub blocks_found: usize,
    pub reminders_sent: usize,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl SweepResult {
    fn new(timestamp: DateTime<Utc>, blocks_found: usize) -> Self {
        Self {
            blocks_found,
            reminders_sent: 0,
            errors: Vec::new(),
            timestamp,
        }
    }
}

pub struct ReminderSweep {
    store: Arc<dyn BlockStore>,
    notifier: Arc<dyn Notifier>,
    dashboard_url: Option<String>,
}

impl ReminderSweep {
    pub fn new(store: Arc<dyn BlockStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            dashboard_url: None,
        }
    }

    pub fn with_dashboard_url(mut self, dashboard_url: Option<String>) -> Self {
        self.dashboard_url = dashboard_url;
        self
    }

    pub async fn run_sweep(&self, lookahead_minutes: i64) -> Result<SweepResult> {
        self.run_sweep_at(Utc::now(), lookahead_minutes).await
    }

    /// Runs a sweep with `now` held fixed for the whole pass.
    ///
    /// Only a failed selection query is returned as an error. Everything
    /// that goes wrong for an individual block lands in
    /// [`SweepResult::errors`] and leaves the other blocks untouched.
    pub async fn run_sweep_at(
        &self,
        now: DateTime<Utc>,
        lookahead_minutes: i64,
    ) -> Result<SweepResult> {
        if lookahead_minutes <= 0 {
            bail!("lookahead must be a positive number of minutes, got {lookahead_minutes}");
        }

        let Some(until) =
            Duration::try_minutes(lookahead_minutes).and_then(|span| now.checked_add_signed(span))
        else {
            bail!("lookahead of {lookahead_minutes} minutes is out of range");
        };
        let due = self
            .store
            .find_due(now, until)
            .await
            .context("failed to select due study blocks")?;

        let mut result = SweepResult::new(now, due.len());

        for block in &due {
            match self.remind(block).await {
                Ok(()) => result.reminders_sent += 1,
                Err(message) => {
                    warn!("{message}");
                    result.errors.push(message);
                }
            }
        }

        info!(
            "Reminder sweep at {}: {} due, {} sent, {} failed",
            now.to_rfc3339(),
            result.blocks_found,
            result.reminders_sent,
            result.errors.len()
        );

        Ok(result)
    }

    async fn remind(&self, block: &StudyBlock) -> std::result::Result<(), String> {
        let address = match self.notifier.resolve_contact(&block.user_id).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                return Err(format!(
                    "block {}: no email address on file for user {}",
                    block.id, block.user_id
                ))
            }
            Err(err) => {
                return Err(format!(
                    "block {}: failed to look up user {}: {err:#}",
                    block.id, block.user_id
                ))
            }
        };

        let email = render_reminder(block, &address, self.dashboard_url.as_deref());
        if let Err(err) = self.notifier.deliver(&email).await {
            return Err(format!(
                "block {}: failed to send reminder to {address}: {err:#}",
                block.id
            ));
        }

        match self.store.mark_reminder_sent(&block.id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(format!(
                "block {}: reminder sent but the block was not marked (deleted or already marked)",
                block.id
            )),
            Err(err) => Err(format!(
                "block {}: reminder sent but marking it failed: {err:#}",
                block.id
            )),
        }
    }
}
