//! Waitlist repository for database operations.

use crate::entities::{CreateWaitlistEntryRequest, WaitlistEntry, WaitlistStatus};
use crate::types::{WaitlistError, WaitlistResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const ENTRY_COLUMNS: &str = "id, name, email, subject, message, source, status, created_at";

#[derive(Clone)]
pub struct WaitlistRepository {
    pool: SqlitePool,
}

impl WaitlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new submission with status `new`
    pub async fn create(&self, request: &CreateWaitlistEntryRequest) -> WaitlistResult<WaitlistEntry> {
        let entry = WaitlistEntry {
            id: cuid2::cuid(),
            name: request.name.clone(),
            email: request.email.clone(),
            subject: request.subject.clone(),
            message: request.message.clone(),
            source: request.source.clone(),
            status: WaitlistStatus::New,
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO waitlist (id, name, email, subject, message, source, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.email)
        .bind(&entry.subject)
        .bind(&entry.message)
        .bind(&entry.source)
        .bind(entry.status.as_str())
        .bind(&entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// All entries, newest first
    pub async fn list(&self) -> WaitlistResult<Vec<WaitlistEntry>> {
        sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM waitlist ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(entry_from_row)
        .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> WaitlistResult<Option<WaitlistEntry>> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM waitlist WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    pub async fn update_status(&self, id: &str, status: WaitlistStatus) -> WaitlistResult<WaitlistEntry> {
        let result = sqlx::query("UPDATE waitlist SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WaitlistError::EntryNotFound);
        }

        self.find_by_id(id).await?.ok_or(WaitlistError::EntryNotFound)
    }

    pub async fn delete(&self, id: &str) -> WaitlistResult<()> {
        let result = sqlx::query("DELETE FROM waitlist WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WaitlistError::EntryNotFound);
        }
        Ok(())
    }
}

fn entry_from_row(row: &SqliteRow) -> WaitlistResult<WaitlistEntry> {
    let status: String = row.try_get("status")?;

    Ok(WaitlistEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        source: row.try_get("source")?,
        status: status.parse().map_err(WaitlistError::DatabaseError)?,
        created_at: row.try_get("created_at")?,
    })
}
