//! PostgreSQL storage backend.
//!
//! Uniqueness of issued numbers is enforced by the primary key on
//! `lucky_numbers.number`; a batch goes in as a single `INSERT ... UNNEST`
//! statement so a duplicate aborts the whole batch.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use crate::config::PostgresStorageConfig;
use crate::domain::{CampaignConfig, IssuedNumber, Participant};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{
    CampaignStorage, NumberStorage, ParticipantStorage, SequenceStorage, Storage,
};

/// Row id of the single campaign record.
const CAMPAIGN_ROW: i16 = 1;

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS campaign_config (
        id SMALLINT PRIMARY KEY,
        config JSONB NOT NULL,
        updated_at BIGINT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS participants (
        document TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        registered_at BIGINT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS lucky_numbers (
        number BIGINT PRIMARY KEY,
        document TEXT NOT NULL,
        allocation_id UUID NOT NULL,
        issued_at BIGINT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_lucky_numbers_document ON lucky_numbers (document, issued_at)",
    "CREATE INDEX IF NOT EXISTS idx_lucky_numbers_issued_at ON lucky_numbers (issued_at)",
    r"
    CREATE TABLE IF NOT EXISTS sequence_cursors (
        name TEXT PRIMARY KEY,
        value BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    ",
];

/// PostgreSQL storage implementation.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect and create the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect or a schema statement fails.
    pub async fn connect(config: &PostgresStorageConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!(statements = SCHEMA.len(), "PostgreSQL schema ready");
        Ok(())
    }
}

fn to_db(value: u64) -> StorageResult<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("value {value} exceeds BIGINT")))
}

fn from_db(value: i64) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("negative value {value} in database")))
}

#[async_trait]
impl CampaignStorage for PostgresStorage {
    async fn get_campaign_config(&self) -> StorageResult<Option<CampaignConfig>> {
        let config: Option<Json<CampaignConfig>> =
            sqlx::query_scalar("SELECT config FROM campaign_config WHERE id = $1")
                .bind(CAMPAIGN_ROW)
                .fetch_optional(&self.pool)
                .await?;
        Ok(config.map(|Json(config)| config))
    }

    async fn save_campaign_config(&self, config: &CampaignConfig) -> StorageResult<()> {
        sqlx::query(
            r"
            INSERT INTO campaign_config (id, config, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET config = EXCLUDED.config, updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(CAMPAIGN_ROW)
        .bind(Json(config))
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ParticipantStorage for PostgresStorage {
    async fn insert_participant(&self, participant: &Participant) -> StorageResult<()> {
        sqlx::query(
            r"
            INSERT INTO participants (document, name, email, phone, registered_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&participant.document)
        .bind(&participant.name)
        .bind(&participant.email)
        .bind(&participant.phone)
        .bind(participant.registered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_participant(&self, document: &str) -> StorageResult<Option<Participant>> {
        let row: Option<(String, String, Option<String>, Option<String>, i64)> = sqlx::query_as(
            r"
            SELECT document, name, email, phone, registered_at
            FROM participants
            WHERE document = $1
            ",
        )
        .bind(document)
        .fetch_optional(&self.pool)
        .await?;

        Ok(
            row.map(|(document, name, email, phone, registered_at)| Participant {
                document,
                name,
                email,
                phone,
                registered_at,
            }),
        )
    }
}

#[async_trait]
impl NumberStorage for PostgresStorage {
    async fn issued_in_range(&self, start: u64, end: u64) -> StorageResult<HashSet<u64>> {
        let rows: Vec<i64> = sqlx::query_scalar(
            "SELECT number FROM lucky_numbers WHERE number >= $1 AND number < $2",
        )
        .bind(to_db(start)?)
        .bind(to_db(end)?)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(from_db).collect()
    }

    async fn insert_numbers(&self, numbers: &[IssuedNumber]) -> StorageResult<()> {
        let values = numbers
            .iter()
            .map(|n| to_db(n.number))
            .collect::<StorageResult<Vec<i64>>>()?;
        let documents: Vec<&str> = numbers.iter().map(|n| n.document.as_str()).collect();
        let allocations: Vec<Uuid> = numbers.iter().map(|n| n.allocation_id).collect();
        let issued_at: Vec<i64> = numbers.iter().map(|n| n.issued_at).collect();

        sqlx::query(
            r"
            INSERT INTO lucky_numbers (number, document, allocation_id, issued_at)
            SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::UUID[], $4::BIGINT[])
            ",
        )
        .bind(&values)
        .bind(&documents)
        .bind(&allocations)
        .bind(&issued_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn numbers_for_participant(&self, document: &str) -> StorageResult<Vec<IssuedNumber>> {
        let rows: Vec<(i64, String, Uuid, i64)> = sqlx::query_as(
            r"
            SELECT number, document, allocation_id, issued_at
            FROM lucky_numbers
            WHERE document = $1
            ORDER BY number ASC
            ",
        )
        .bind(document)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(number, document, allocation_id, issued_at)| {
                Ok(IssuedNumber {
                    number: from_db(number)?,
                    document,
                    allocation_id,
                    issued_at,
                })
            })
            .collect()
    }

    async fn count_for_participant(
        &self,
        document: &str,
        since: Option<i64>,
    ) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lucky_numbers WHERE document = $1 AND issued_at >= $2",
        )
        .bind(document)
        .bind(since.unwrap_or(i64::MIN))
        .fetch_one(&self.pool)
        .await?;
        from_db(count)
    }

    async fn count_issued_since(&self, since: i64) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lucky_numbers WHERE issued_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        from_db(count)
    }
}

#[async_trait]
impl SequenceStorage for PostgresStorage {
    async fn get_cursor(&self, name: &str) -> StorageResult<Option<u64>> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM sequence_cursors WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        value.map(from_db).transpose()
    }

    async fn set_cursor(&self, name: &str, value: u64) -> StorageResult<()> {
        sqlx::query(
            r"
            INSERT INTO sequence_cursors (name, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(name)
        .bind(to_db(value)?)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn compare_and_set_cursor(
        &self,
        name: &str,
        expected: Option<u64>,
        value: u64,
    ) -> StorageResult<bool> {
        let now = chrono::Utc::now().timestamp_millis();
        let result = match expected {
            None => {
                sqlx::query(
                    r"
                    INSERT INTO sequence_cursors (name, value, updated_at)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (name) DO NOTHING
                    ",
                )
                .bind(name)
                .bind(to_db(value)?)
                .bind(now)
                .execute(&self.pool)
                .await?
            }
            Some(expected) => {
                sqlx::query(
                    r"
                    UPDATE sequence_cursors
                    SET value = $2, updated_at = $3
                    WHERE name = $1 AND value = $4
                    ",
                )
                .bind(name)
                .bind(to_db(value)?)
                .bind(now)
                .bind(to_db(expected)?)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}
