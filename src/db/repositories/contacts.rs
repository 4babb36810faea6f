use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::{connection::Database, helpers::format_datetime, models::UserContact};

impl Database {
    /// Stores or replaces the email address on file for a user.
    pub async fn upsert_contact(
        &self,
        user_id: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<UserContact> {
        let email = email.trim();
        if user_id.trim().is_empty() {
            bail!("user id must not be empty");
        }
        if !email.contains('@') {
            bail!("'{email}' is not an email address");
        }

        let contact = UserContact {
            user_id: user_id.to_string(),
            email: email.to_string(),
            updated_at,
        };

        let record = contact.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO user_contacts (user_id, email, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                     email = excluded.email,
                     updated_at = excluded.updated_at",
                params![
                    record.user_id,
                    record.email,
                    format_datetime(&record.updated_at),
                ],
            )
            .with_context(|| "failed to store user contact")?;
            Ok(())
        })
        .await?;

        Ok(contact)
    }

    pub async fn get_contact_email(&self, user_id: &str) -> Result<Option<String>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let email = conn
                .query_row(
                    "SELECT email FROM user_contacts WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(email)
        })
        .await
    }
}
