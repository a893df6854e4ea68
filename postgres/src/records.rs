//! `emails` table access.

use chrono::{DateTime, Utc};
use complaints_core::{Attachment, RecordId, RecordStore, StoreError, SubmittedRecord};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;

/// `PostgreSQL`-backed [`RecordStore`].
///
/// Record ids are UUIDs in the database. An id that is not a valid UUID
/// cannot exist in the table, so looking it up is a not-found rather than
/// an error.
///
/// # Example
///
/// ```no_run
/// use complaints_postgres::PostgresRecordStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresRecordStore::connect("postgres://localhost/complaints").await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect with a pool of up to 10 connections.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionFailed`] if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MigrationFailed`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: &PgRow) -> Result<SubmittedRecord, StoreError> {
        let id: Uuid = row.try_get("id").map_err(|e| corrupt("<unknown>", &e))?;
        let id_text = id.to_string();
        let field = |e: sqlx::Error| corrupt(&id_text, &e);

        let attachment_name: Option<String> = row.try_get("attachment_name").map_err(field)?;
        let attachment_data: Option<Vec<u8>> = row.try_get("attachment_data").map_err(field)?;
        let submitted_at: DateTime<Utc> = row.try_get("submitted_at").map_err(field)?;

        Ok(SubmittedRecord {
            id: RecordId::new(id_text.clone()),
            email_id: row.try_get("email_id").map_err(field)?,
            first_name: row.try_get("first_name").map_err(field)?,
            last_name: row.try_get("last_name").map_err(field)?,
            email: row.try_get("email").map_err(field)?,
            subject: row.try_get("subject").map_err(field)?,
            body: row.try_get("body").map_err(field)?,
            attachment: attachment_name
                .map(|name| Attachment::new(name, attachment_data.unwrap_or_default())),
            submitted_at,
        })
    }
}

fn corrupt(id: &str, error: &sqlx::Error) -> StoreError {
    StoreError::CorruptRecord {
        id: id.to_string(),
        reason: error.to_string(),
    }
}

impl RecordStore for PostgresRecordStore {
    fn get_by_id<'a>(
        &'a self,
        id: &'a RecordId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SubmittedRecord>, StoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            let Ok(uuid) = Uuid::parse_str(id.as_str()) else {
                tracing::debug!(id = %id, "Record id is not a UUID, treating as not found");
                return Ok(None);
            };

            let row = sqlx::query(
                r"
                SELECT id, email_id, first_name, last_name, email, subject, body,
                       attachment_name, attachment_data, submitted_at
                FROM emails
                WHERE id = $1
                ",
            )
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

            row.as_ref().map(Self::row_to_record).transpose()
        })
    }

    fn insert<'a>(
        &'a self,
        record: &'a SubmittedRecord,
    ) -> Pin<Box<dyn Future<Output = Result<RecordId, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let uuid = Uuid::parse_str(record.id.as_str()).map_err(|e| {
                StoreError::DatabaseError(format!("Record id {} is not a UUID: {e}", record.id))
            })?;

            sqlx::query(
                r"
                INSERT INTO emails (
                    id, email_id, first_name, last_name, email, subject, body,
                    attachment_name, attachment_data, submitted_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(uuid)
            .bind(&record.email_id)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.email)
            .bind(&record.subject)
            .bind(&record.body)
            .bind(record.attachment.as_ref().map(|a| a.name.as_str()))
            .bind(record.attachment.as_ref().map(|a| a.data.as_slice()))
            .bind(record.submitted_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

            tracing::info!(
                id = %record.id,
                attachment = record.attachment.is_some(),
                "Complaint record stored"
            );
            metrics::counter!("record_store_inserts_total").increment(1);

            Ok(record.id.clone())
        })
    }
}
