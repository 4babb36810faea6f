use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_bool},
    models::{NewStudyBlock, StudyBlock},
};

const BLOCK_COLUMNS: &str = "id, user_id, start_time, end_time, reminder_sent, created_at";

fn row_to_study_block(row: &Row) -> Result<StudyBlock> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;
    let reminder_sent: i64 = row.get("reminder_sent")?;

    Ok(StudyBlock {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_datetime(&end_time, "end_time")?,
        reminder_sent: to_bool(reminder_sent, "reminder_sent")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Validates `input` against `now` and stores it as a new block with the
    /// reminder flag cleared.
    pub async fn create_study_block(
        &self,
        input: NewStudyBlock,
        now: DateTime<Utc>,
    ) -> Result<StudyBlock> {
        input.validate(now)?;

        // Stored text keeps microseconds; return what a later read will see.
        let block = StudyBlock {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            start_time: input.start_time.trunc_subsecs(6),
            end_time: input.end_time.trunc_subsecs(6),
            reminder_sent: false,
            created_at: now.trunc_subsecs(6),
        };

        let record = block.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO study_blocks (id, user_id, start_time, end_time, reminder_sent, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![
                    record.id,
                    record.user_id,
                    format_datetime(&record.start_time),
                    format_datetime(&record.end_time),
                    format_datetime(&record.created_at),
                ],
            )
            .with_context(|| "failed to insert study block")?;
            Ok(())
        })
        .await?;

        Ok(block)
    }

    pub async fn get_study_block(&self, block_id: &str) -> Result<Option<StudyBlock>> {
        let block_id = block_id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {BLOCK_COLUMNS} FROM study_blocks WHERE id = ?1");
            let block = conn
                .query_row(&sql, params![block_id], |row| Ok(row_to_study_block(row)))
                .optional()?
                .transpose()?;
            Ok(block)
        })
        .await
    }

    /// Lists blocks ordered by start time, optionally restricted to one owner.
    pub async fn list_study_blocks(&self, user_id: Option<&str>) -> Result<Vec<StudyBlock>> {
        let user_id = user_id.map(str::to_string);
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {BLOCK_COLUMNS}
                 FROM study_blocks
                 WHERE ?1 IS NULL OR user_id = ?1
                 ORDER BY start_time ASC"
            );
            let mut stmt = conn.prepare(&sql)?;

            let mut rows = stmt.query(params![user_id])?;
            let mut blocks = Vec::new();
            while let Some(row) = rows.next()? {
                blocks.push(row_to_study_block(row)?);
            }

            Ok(blocks)
        })
        .await
    }

    /// Returns whether a row was removed.
    pub async fn delete_study_block(&self, block_id: &str) -> Result<bool> {
        let block_id = block_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute("DELETE FROM study_blocks WHERE id = ?1", params![block_id])
                .with_context(|| "failed to delete study block")?;
            Ok(rows_affected > 0)
        })
        .await
    }

    /// Blocks still awaiting a reminder whose start lies in `[from, until]`,
    /// both ends inclusive.
    pub async fn find_due_blocks(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<StudyBlock>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {BLOCK_COLUMNS}
                 FROM study_blocks
                 WHERE reminder_sent = 0
                   AND start_time >= ?1
                   AND start_time <= ?2
                 ORDER BY start_time ASC"
            );
            let mut stmt = conn.prepare(&sql)?;

            let mut rows = stmt.query(params![format_datetime(&from), format_datetime(&until)])?;
            let mut blocks = Vec::new();
            while let Some(row) = rows.next()? {
                blocks.push(row_to_study_block(row)?);
            }

            Ok(blocks)
        })
        .await
        .with_context(|| "failed to query due study blocks")
    }

    /// Sets the reminder flag. Returns `false` when the block is gone or was
    /// already flagged, so the flag can never be applied twice.
    pub async fn mark_reminder_sent(&self, block_id: &str) -> Result<bool> {
        let block_id = block_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute(
                    "UPDATE study_blocks
                     SET reminder_sent = 1
                     WHERE id = ?1 AND reminder_sent = 0",
                    params![block_id],
                )
                .with_context(|| "failed to mark reminder as sent")?;
            Ok(rows_affected > 0)
        })
        .await
    }
}
