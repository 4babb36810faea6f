use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::Database;

use super::mail::MailTransport;
use super::message::OutgoingEmail;

/// Identity lookup plus delivery, as seen by the reminder sweep.
///
/// Both calls report failure through their return value; the sweep turns
/// those into per-block error entries.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `Ok(None)` when the user has no address on file.
    async fn resolve_contact(&self, user_id: &str) -> Result<Option<String>>;

    async fn deliver(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Resolves addresses from the local contact table and hands messages to a
/// mail transport.
pub struct EmailNotifier {
    contacts: Database,
    transport: Arc<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(contacts: Database, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            contacts,
            transport,
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn resolve_contact(&self, user_id: &str) -> Result<Option<String>> {
        let email = self.contacts.get_contact_email(user_id).await?;
        Ok(email.filter(|address| !address.trim().is_empty()))
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<()> {
        self.transport.send(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn resolves_from_contact_table_and_forwards_to_transport() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("blocks.sqlite3")).unwrap();
        db.upsert_contact("user-1", "student@example.com", Utc::now())
            .await
            .unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let notifier = EmailNotifier::new(db, transport.clone());

        assert_eq!(
            notifier.resolve_contact("user-1").await.unwrap().as_deref(),
            Some("student@example.com")
        );
        assert_eq!(notifier.resolve_contact("ghost").await.unwrap(), None);

        let email = OutgoingEmail {
            to: "student@example.com".into(),
            subject: "subject".into(),
            body: "body".into(),
        };
        notifier.deliver(&email).await.unwrap();
        assert_eq!(*transport.sent.lock().unwrap(), vec![email]);
    }
}
