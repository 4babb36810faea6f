use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::{Database, StudyBlock};

/// The slice of block storage the reminder sweep depends on.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Unreminded blocks whose start lies in `[from, until]`.
    async fn find_due(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<StudyBlock>>;

    /// `Ok(false)` means the block no longer exists or was already marked.
    async fn mark_reminder_sent(&self, block_id: &str) -> Result<bool>;
}

#[async_trait]
impl BlockStore for Database {
    async fn find_due(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<StudyBlock>> {
        self.find_due_blocks(from, until).await
    }

    async fn mark_reminder_sent(&self, block_id: &str) -> Result<bool> {
        Database::mark_reminder_sent(self, block_id).await
    }
}
