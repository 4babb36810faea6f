//! In-memory collaborators for sweep and scheduler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::db::StudyBlock;

use super::message::OutgoingEmail;
use super::notifier::Notifier;
use super::store::BlockStore;

pub fn block_starting_in(
    id: &str,
    user_id: &str,
    now: DateTime<Utc>,
    offset: Duration,
) -> StudyBlock {
    let start_time = now + offset;
    StudyBlock {
        id: id.to_string(),
        user_id: user_id.to_string(),
        start_time,
        end_time: start_time + Duration::minutes(30),
        reminder_sent: false,
        created_at: now - Duration::days(1),
    }
}

#[derive(Default)]
pub struct FakeStore {
    blocks: Mutex<Vec<StudyBlock>>,
    delete_before_mark: Mutex<HashSet<String>>,
    fail_selection: AtomicBool,
    find_due_calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_blocks(blocks: Vec<StudyBlock>) -> Self {
        Self {
            blocks: Mutex::new(blocks),
            ..Self::default()
        }
    }

    pub fn fail_selection(&self) {
        self.fail_selection.store(true, Ordering::SeqCst);
    }

    /// Simulates a user deleting the block while its email is in flight.
    pub fn delete_before_mark(&self, block_id: &str) {
        self.delete_before_mark
            .lock()
            .unwrap()
            .insert(block_id.to_string());
    }

    pub fn is_marked(&self, block_id: &str) -> bool {
        self.blocks
            .lock()
            .unwrap()
            .iter()
            .any(|block| block.id == block_id && block.reminder_sent)
    }

    pub fn find_due_calls(&self) -> usize {
        self.find_due_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockStore for FakeStore {
    async fn find_due(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<StudyBlock>> {
        self.find_due_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_selection.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }

        Ok(self
            .blocks
            .lock()
            .unwrap()
            .iter()
            .filter(|block| {
                !block.reminder_sent && block.start_time >= from && block.start_time <= until
            })
            .cloned()
            .collect())
    }

    async fn mark_reminder_sent(&self, block_id: &str) -> Result<bool> {
        let mut blocks = self.blocks.lock().unwrap();
        if self.delete_before_mark.lock().unwrap().remove(block_id) {
            blocks.retain(|block| block.id != block_id);
        }

        match blocks
            .iter_mut()
            .find(|block| block.id == block_id && !block.reminder_sent)
        {
            Some(block) => {
                block.reminder_sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    contacts: Mutex<HashMap<String, String>>,
    failing_lookups: Mutex<HashSet<String>>,
    failing_deliveries: Mutex<HashSet<String>>,
    delivered: Mutex<Vec<OutgoingEmail>>,
}

impl FakeNotifier {
    pub fn with_contact(user_id: &str, email: &str) -> Self {
        let notifier = Self::default();
        notifier.add_contact(user_id, email);
        notifier
    }

    pub fn add_contact(&self, user_id: &str, email: &str) {
        self.contacts
            .lock()
            .unwrap()
            .insert(user_id.to_string(), email.to_string());
    }

    pub fn fail_lookup_for(&self, user_id: &str) {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(user_id.to_string());
    }

    pub fn fail_delivery_to(&self, email: &str) {
        self.failing_deliveries
            .lock()
            .unwrap()
            .insert(email.to_string());
    }

    pub fn delivered(&self) -> Vec<OutgoingEmail> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.delivered().into_iter().map(|email| email.to).collect()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn resolve_contact(&self, user_id: &str) -> Result<Option<String>> {
        if self.failing_lookups.lock().unwrap().contains(user_id) {
            return Err(anyhow!("identity service unavailable"));
        }
        Ok(self.contacts.lock().unwrap().get(user_id).cloned())
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<()> {
        if self.failing_deliveries.lock().unwrap().contains(&email.to) {
            return Err(anyhow!("mail transport rejected message"));
        }
        self.delivered.lock().unwrap().push(email.clone());
        Ok(())
    }
}
