//! Token store trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{NewRefreshToken, RefreshTokenRecord};
use crate::errors::StoreError;

/// Fresh token material for the record that replaces a rotated one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor {
    /// Keyed hash of the new token value
    pub token_hash: String,
    /// Rotation instant; also the `revoked_at` of the predecessor
    pub issued_at: DateTime<Utc>,
    /// Expiry of the new token
    pub expires_at: DateTime<Utc>,
}

/// Result of the atomic read-validate-revoke-issue unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The presented record was revoked and its successor inserted
    Rotated {
        previous: RefreshTokenRecord,
        successor: RefreshTokenRecord,
    },
    /// No record carries the presented hash
    NotFound,
    /// The presented record is past its expiry; nothing was changed
    Expired(RefreshTokenRecord),
    /// The presented record had already been revoked; nothing was changed
    AlreadyRevoked(RefreshTokenRecord),
}

/// Store trait for refresh token records
///
/// Implementations hold no business logic beyond the predicates below.
///
/// # Concurrency Requirements
/// - `rotate` must serialize on the presented record: of two concurrent calls
///   for the same hash, exactly one may return `Rotated`
/// - `token_hash` uniqueness is enforced by the store
/// - Bulk deletes only ever match rows that are expired-and-unrevoked or
///   revoked before the cutoff
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new token and assign its identifier
    ///
    /// # Returns
    /// * `Ok(RefreshTokenRecord)` - The stored record with its new `id`
    /// * `Err(StoreError::Duplicate)` - A record with the same hash exists
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, StoreError>;

    /// Find a record by its token hash, regardless of state
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Find a record by its identifier, regardless of state
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Valid (unrevoked, unexpired) records of a subject, newest first
    async fn find_active_by_subject(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRecord>, StoreError>;

    /// Revoke the record with the given id if it is not revoked yet
    ///
    /// Returns `true` only when this call flipped the flag.
    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revoke a single record if it is not revoked yet
    ///
    /// # Returns
    /// * `Ok(true)` - This call flipped the flag
    /// * `Ok(false)` - Unknown hash or already revoked
    async fn revoke_by_hash(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revoke every unrevoked record of a subject, returning how many flipped
    async fn revoke_by_subject(&self, subject_id: &str, at: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Revoke every unrevoked record of a session family, returning how many flipped
    async fn revoke_by_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Atomically retire the presented record and insert its successor
    ///
    /// The lookup, the expiry and revocation checks, the conditional revoke
    /// and the insert form one unit. `successor.issued_at` is the clock used
    /// for the expiry check.
    async fn rotate(&self, presented_hash: &str, successor: Successor) -> Result<RotationOutcome, StoreError>;

    /// Delete every record of a subject (account deletion)
    async fn delete_by_subject(&self, subject_id: &str) -> Result<usize, StoreError>;

    /// Delete up to `limit` unrevoked records with `expires_at < now`
    ///
    /// Revoked records are left for `delete_revoked_before` so that their
    /// audit window applies even after expiry.
    async fn delete_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<usize, StoreError>;

    /// Delete up to `limit` records revoked strictly before `cutoff`
    async fn delete_revoked_before(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, StoreError>;

    /// Count valid records of a subject
    async fn count_active_by_subject(&self, subject_id: &str, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let tokens = self.find_active_by_subject(subject_id, now).await?;
        Ok(tokens.len())
    }
}
