//! MySQL implementation of the TokenStore trait.
//!
//! Records live in the `refresh_tokens` table created by the embedded
//! migrations. Identifiers are stored as hyphenated UUID strings and only
//! the keyed hash of a token value ever reaches the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use uuid::Uuid;

use rt_core::domain::entities::token::{NewRefreshToken, RefreshTokenRecord};
use rt_core::errors::StoreError;
use rt_core::repositories::token::{RotationOutcome, Successor, TokenStore};

const SELECT_COLUMNS: &str = r#"
    SELECT id, token_hash, subject_id, family_id, parent_id,
           created_at, expires_at, revoked, revoked_at
    FROM refresh_tokens
"#;

/// MySQL implementation of TokenStore
///
/// `rotate` runs in a transaction that locks the presented row with
/// `SELECT ... FOR UPDATE`, so concurrent rotations of one token serialize
/// and only the first sees it unrevoked.
#[derive(Clone)]
pub struct MySqlTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenStore {
    /// Create a new MySQL token store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshTokenRecord
    fn row_to_record(row: &MySqlRow) -> Result<RefreshTokenRecord, StoreError> {
        let id: String = row.try_get("id").map_err(corrupt("id"))?;
        let family_id: String = row.try_get("family_id").map_err(corrupt("family_id"))?;
        let parent_id: Option<String> = row.try_get("parent_id").map_err(corrupt("parent_id"))?;

        Ok(RefreshTokenRecord {
            id: parse_uuid(&id)?,
            token_hash: row.try_get("token_hash").map_err(corrupt("token_hash"))?,
            subject_id: row.try_get("subject_id").map_err(corrupt("subject_id"))?,
            family_id: parse_uuid(&family_id)?,
            parent_id: parent_id.as_deref().map(parse_uuid).transpose()?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(corrupt("created_at"))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(corrupt("expires_at"))?,
            revoked: row.try_get("revoked").map_err(corrupt("revoked"))?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(corrupt("revoked_at"))?,
        })
    }

    fn rows_to_records(rows: &[MySqlRow]) -> Result<Vec<RefreshTokenRecord>, StoreError> {
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn insert_with<'e, E>(executor: E, record: &RefreshTokenRecord) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::MySql>,
    {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, token_hash, subject_id, family_id, parent_id,
                created_at, expires_at, revoked, revoked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(&record.token_hash)
            .bind(&record.subject_id)
            .bind(record.family_id.to_string())
            .bind(record.parent_id.map(|id| id.to_string()))
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.revoked)
            .bind(record.revoked_at)
            .execute(executor)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

/// Unique violations become `Duplicate`, everything else `Unavailable`
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn corrupt(column: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Corrupt(format!("Failed to get {}: {}", column, e))
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Corrupt(format!("Invalid UUID {:?}: {}", value, e)))
}

#[async_trait]
impl TokenStore for MySqlTokenStore {
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, StoreError> {
        let record = token.into_record(Uuid::new_v4());
        Self::insert_with(&self.pool, &record).await?;
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let query = format!("{} WHERE token_hash = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let query = format!("{} WHERE id = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_active_by_subject(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRecord>, StoreError> {
        let query = format!(
            "{} WHERE subject_id = ? AND revoked = FALSE AND expires_at > ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(subject_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::rows_to_records(&rows)
    }

    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?
            WHERE id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_by_hash(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?
            WHERE token_hash = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_by_subject(&self, subject_id: &str, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?
            WHERE subject_id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_by_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?
            WHERE family_id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(family_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn rotate(&self, presented_hash: &str, successor: Successor) -> Result<RotationOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let query = format!("{} WHERE token_hash = ? FOR UPDATE", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(presented_hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let mut previous = match row {
            None => return Ok(RotationOutcome::NotFound),
            Some(row) => Self::row_to_record(&row)?,
        };

        // Rejections leave the row untouched; dropping `tx` rolls back
        if previous.is_expired_at(successor.issued_at) {
            return Ok(RotationOutcome::Expired(previous));
        }
        if previous.revoked {
            return Ok(RotationOutcome::AlreadyRevoked(previous));
        }

        let revoke = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?
            WHERE id = ? AND revoked = FALSE
        "#;
        let result = sqlx::query(revoke)
            .bind(successor.issued_at)
            .bind(previous.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            // Only reachable if the row lock was not honoured
            return Ok(RotationOutcome::AlreadyRevoked(previous));
        }
        previous.revoke(successor.issued_at);

        let next = NewRefreshToken::successor(
            &previous,
            successor.token_hash,
            successor.issued_at,
            successor.expires_at,
        )
        .into_record(Uuid::new_v4());

        Self::insert_with(&mut *tx, &next).await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(RotationOutcome::Rotated {
            previous,
            successor: next,
        })
    }

    async fn delete_by_subject(&self, subject_id: &str) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE subject_id = ?")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<usize, StoreError> {
        let query = r#"
            DELETE FROM refresh_tokens
            WHERE revoked = FALSE AND expires_at < ?
            LIMIT ?
        "#;

        let result = sqlx::query(query)
            .bind(now)
            .bind(limit as u64)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_revoked_before(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, StoreError> {
        let query = r#"
            DELETE FROM refresh_tokens
            WHERE revoked = TRUE AND revoked_at < ?
            LIMIT ?
        "#;

        let result = sqlx::query(query)
            .bind(cutoff)
            .bind(limit as u64)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn count_active_by_subject(&self, subject_id: &str, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let query = r#"
            SELECT COUNT(*) AS active
            FROM refresh_tokens
            WHERE subject_id = ? AND revoked = FALSE AND expires_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(subject_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let count: i64 = row.try_get("active").map_err(corrupt("active"))?;
        Ok(count as usize)
    }
}
