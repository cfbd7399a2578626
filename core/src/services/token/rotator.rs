//! Session rotator: the refresh token state machine
//!
//! The rotator is the only component that mints or invalidates refresh
//! tokens. It hashes presented values with the codec and delegates every
//! state change to the store's atomic primitives; nothing is cached between
//! calls.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rt_shared::config::{ReusePolicy, SessionConfig};

use crate::domain::entities::token::{expiry_after, IssuedToken, NewRefreshToken, RefreshTokenRecord};
use crate::errors::{DomainResult, StoreError, TokenError};
use crate::repositories::token::{RotationOutcome, Successor, TokenStore};

use super::codec::TokenCodec;
use super::config::RotatorConfig;

/// Attempts at drawing a value whose hash is not stored yet
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issues, validates, rotates and revokes refresh tokens
pub struct SessionRotator<S: TokenStore> {
    store: Arc<S>,
    codec: TokenCodec,
    config: RotatorConfig,
}

impl<S: TokenStore> SessionRotator<S> {
    /// Creates a rotator over `store`
    pub fn new(store: Arc<S>, codec: TokenCodec, config: RotatorConfig) -> Self {
        Self {
            store,
            codec,
            config,
        }
    }

    /// Creates a rotator from the session configuration
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` when the hashing secret or token size is too
    /// small, or the lifetime is not positive or longer than a year.
    pub fn from_config(store: Arc<S>, config: &SessionConfig) -> DomainResult<Self> {
        let codec = TokenCodec::from_config(config)?;
        Ok(Self::new(store, codec, RotatorConfig::try_from(config)?))
    }

    pub fn config(&self) -> &RotatorConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issues the first token of a new session family for `subject_id`
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - Raw value for the client plus the stored record
    /// * `Err(TokenError::InvalidSubject)` - Blank subject
    /// * `Err(TokenError::StoreUnavailable)` - Store failure
    pub async fn issue(&self, subject_id: &str) -> Result<IssuedToken, TokenError> {
        if subject_id.trim().is_empty() {
            return Err(TokenError::InvalidSubject);
        }

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = self.codec.generate();
            let new_token = NewRefreshToken::family_root(
                subject_id,
                self.codec.hash(&token),
                Utc::now(),
                self.config.refresh_token_ttl,
            );

            match self.store.insert(new_token).await {
                Ok(record) => {
                    info!(
                        subject_id = %record.subject_id,
                        family_id = %record.family_id,
                        "Issued refresh token"
                    );
                    return Ok(IssuedToken { token, record });
                }
                Err(StoreError::Duplicate) => {
                    warn!(subject_id, attempt, "Refresh token hash collision on issue, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Self::exhausted_attempts())
    }

    /// Exchanges a valid token for its successor
    ///
    /// The presented token is revoked and a new one is issued in the same
    /// family as one atomic store operation. Presenting a token that was
    /// already revoked triggers the configured reuse policy.
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - The successor
    /// * `Err(TokenError::UnknownToken)` - Malformed or never issued
    /// * `Err(TokenError::Expired)` - Past its expiry, nothing changed
    /// * `Err(TokenError::ReuseDetected)` - Already rotated away or revoked
    /// * `Err(TokenError::StoreUnavailable)` - Store failure
    pub async fn rotate(&self, presented: &str) -> Result<IssuedToken, TokenError> {
        if !self.codec.is_well_formed(presented) {
            debug!("Rejected malformed refresh token");
            return Err(TokenError::UnknownToken);
        }
        let presented_hash = self.codec.hash(presented);

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = self.codec.generate();
            let now = Utc::now();
            let successor = Successor {
                token_hash: self.codec.hash(&token),
                issued_at: now,
                expires_at: expiry_after(now, self.config.refresh_token_ttl),
            };

            let outcome = match self.store.rotate(&presented_hash, successor).await {
                Ok(outcome) => outcome,
                Err(StoreError::Duplicate) => {
                    warn!(attempt, "Refresh token hash collision on rotate, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            return match outcome {
                RotationOutcome::Rotated { previous, successor } => {
                    info!(
                        subject_id = %successor.subject_id,
                        family_id = %successor.family_id,
                        previous_id = %previous.id,
                        "Rotated refresh token"
                    );
                    Ok(IssuedToken {
                        token,
                        record: successor,
                    })
                }
                RotationOutcome::NotFound => Err(TokenError::UnknownToken),
                RotationOutcome::Expired(record) => {
                    debug!(subject_id = %record.subject_id, "Rejected expired refresh token");
                    Err(TokenError::Expired)
                }
                RotationOutcome::AlreadyRevoked(record) => {
                    self.respond_to_reuse(&record).await?;
                    Err(TokenError::ReuseDetected)
                }
            };
        }

        Err(Self::exhausted_attempts())
    }

    /// Checks a presented token without changing any state
    ///
    /// Expiry is checked before revocation, matching `rotate`.
    pub async fn validate(&self, presented: &str) -> Result<String, TokenError> {
        let record = self.lookup(presented).await?.ok_or(TokenError::UnknownToken)?;

        if record.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }
        if record.revoked {
            return Err(TokenError::Revoked);
        }

        Ok(record.subject_id)
    }

    /// Revokes a single token (logout)
    ///
    /// Unknown, malformed or already revoked tokens are not an error.
    pub async fn revoke(&self, presented: &str) -> Result<(), TokenError> {
        if !self.codec.is_well_formed(presented) {
            return Ok(());
        }

        let flipped = self
            .store
            .revoke_by_hash(&self.codec.hash(presented), Utc::now())
            .await?;
        if flipped {
            info!("Revoked refresh token");
        }
        Ok(())
    }

    /// Revokes every token of a subject, returning how many were still live
    pub async fn revoke_all(&self, subject_id: &str) -> Result<usize, TokenError> {
        let count = self.store.revoke_by_subject(subject_id, Utc::now()).await?;
        info!(subject_id, count, "Revoked all refresh tokens of subject");
        Ok(count)
    }

    /// Revokes a single session family, e.g. one device
    pub async fn revoke_family(&self, family_id: Uuid) -> Result<usize, TokenError> {
        let count = self.store.revoke_by_family(family_id, Utc::now()).await?;
        info!(%family_id, count, "Revoked refresh token family");
        Ok(count)
    }

    /// Currently valid tokens of a subject, newest first
    pub async fn active_sessions(&self, subject_id: &str) -> Result<Vec<RefreshTokenRecord>, TokenError> {
        Ok(self.store.find_active_by_subject(subject_id, Utc::now()).await?)
    }

    /// Applies the reuse policy to the record a replayed token points at
    async fn respond_to_reuse(&self, record: &RefreshTokenRecord) -> Result<(), TokenError> {
        let now = Utc::now();
        let revoked = match self.config.reuse_policy {
            ReusePolicy::RevokeSubject => self.store.revoke_by_subject(&record.subject_id, now).await?,
            ReusePolicy::RevokeFamily => self.store.revoke_by_family(record.family_id, now).await?,
            ReusePolicy::RejectOnly => 0,
        };

        warn!(
            subject_id = %record.subject_id,
            family_id = %record.family_id,
            policy = ?self.config.reuse_policy,
            revoked,
            "Refresh token reuse detected"
        );
        Ok(())
    }

    async fn lookup(&self, presented: &str) -> Result<Option<RefreshTokenRecord>, TokenError> {
        if !self.codec.is_well_formed(presented) {
            return Ok(None);
        }
        Ok(self.store.find_by_hash(&self.codec.hash(presented)).await?)
    }

    fn exhausted_attempts() -> TokenError {
        TokenError::StoreUnavailable {
            message: format!(
                "no unique token value after {} attempts",
                MAX_ISSUE_ATTEMPTS
            ),
        }
    }
}
