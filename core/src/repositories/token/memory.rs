//! In-memory implementation of TokenStore
//!
//! Every mutation runs under a single write lock, which makes `rotate`
//! trivially atomic. Suitable for tests and single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{NewRefreshToken, RefreshTokenRecord};
use crate::errors::StoreError;

use super::r#trait::{RotationOutcome, Successor, TokenStore};

/// Token store keyed by token hash
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records in any state
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    /// Insert a fully formed record, bypassing id assignment
    ///
    /// Used to seed fixtures such as already-expired or already-revoked tokens.
    pub async fn insert_record(&self, record: RefreshTokenRecord) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&record.token_hash) {
            return Err(StoreError::Duplicate);
        }
        tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    fn delete_matching<F>(tokens: &mut HashMap<String, RefreshTokenRecord>, limit: usize, predicate: F) -> usize
    where
        F: Fn(&RefreshTokenRecord) -> bool,
    {
        let doomed: Vec<String> = tokens
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(hash, _)| hash.clone())
            .take(limit)
            .collect();

        for hash in &doomed {
            tokens.remove(hash);
        }
        doomed.len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, StoreError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Duplicate);
        }

        let record = token.into_record(Uuid::new_v4());
        tokens.insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.id == id).cloned())
    }

    async fn find_active_by_subject(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRecord>, StoreError> {
        let tokens = self.tokens.read().await;
        let mut active: Vec<RefreshTokenRecord> = tokens
            .values()
            .filter(|t| t.subject_id == subject_id && t.is_valid_at(now))
            .cloned()
            .collect();

        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .values_mut()
            .find(|t| t.id == id)
            .map(|token| token.revoke(at))
            .unwrap_or(false))
    }

    async fn revoke_by_hash(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .get_mut(token_hash)
            .map(|token| token.revoke(at))
            .unwrap_or(false))
    }

    async fn revoke_by_subject(&self, subject_id: &str, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;

        for token in tokens.values_mut() {
            if token.subject_id == subject_id && token.revoke(at) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn revoke_by_family(&self, family_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;

        for token in tokens.values_mut() {
            if token.family_id == family_id && token.revoke(at) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn rotate(&self, presented_hash: &str, successor: Successor) -> Result<RotationOutcome, StoreError> {
        let mut tokens = self.tokens.write().await;

        let previous = match tokens.get(presented_hash) {
            None => return Ok(RotationOutcome::NotFound),
            Some(record) if record.is_expired_at(successor.issued_at) => {
                return Ok(RotationOutcome::Expired(record.clone()));
            }
            Some(record) if record.revoked => {
                return Ok(RotationOutcome::AlreadyRevoked(record.clone()));
            }
            Some(record) => record.clone(),
        };

        if tokens.contains_key(&successor.token_hash) {
            return Err(StoreError::Duplicate);
        }

        let next = NewRefreshToken::successor(
            &previous,
            successor.token_hash,
            successor.issued_at,
            successor.expires_at,
        )
        .into_record(Uuid::new_v4());

        let previous = match tokens.get_mut(presented_hash) {
            Some(record) => {
                record.revoke(successor.issued_at);
                record.clone()
            }
            None => return Ok(RotationOutcome::NotFound),
        };
        tokens.insert(next.token_hash.clone(), next.clone());

        Ok(RotationOutcome::Rotated {
            previous,
            successor: next,
        })
    }

    async fn delete_by_subject(&self, subject_id: &str) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        let initial_count = tokens.len();
        tokens.retain(|_, token| token.subject_id != subject_id);
        Ok(initial_count - tokens.len())
    }

    async fn delete_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(Self::delete_matching(&mut tokens, limit, |t| {
            !t.revoked && t.expires_at < now
        }))
    }

    async fn delete_revoked_before(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(Self::delete_matching(&mut tokens, limit, |t| t.is_revoked_before(cutoff)))
    }
}
