//! Refresh token entities.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refresh token lifetime when no configuration overrides it (30 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Longest refresh token lifetime a configuration may ask for (one year)
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

/// Expiry of a token issued at `issued_at`, saturating instead of overflowing
pub fn expiry_after(issued_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    issued_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Refresh token record stored in the database
///
/// The raw token value never reaches this struct; only its keyed hash does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Surrogate identifier assigned by the store
    pub id: Uuid,

    /// Keyed hash of the token value handed to the client
    pub token_hash: String,

    /// Principal this token authenticates
    pub subject_id: String,

    /// Session family shared by every token produced by rotation from one issue
    pub family_id: Uuid,

    /// Record this one replaced during rotation, `None` for a family root
    pub parent_id: Option<Uuid>,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked (never reset once set)
    pub revoked: bool,

    /// Timestamp when the token was revoked
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Checks if the token has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A token is valid if it is neither revoked nor expired at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Checks if the token is currently valid
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether this record started its session family
    pub fn is_family_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the token was revoked strictly before `cutoff`
    pub fn is_revoked_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.revoked && self.revoked_at.map_or(false, |at| at < cutoff)
    }

    /// Flags the record as revoked
    ///
    /// Returns `false` when it was already revoked; the original
    /// `revoked_at` is kept in that case.
    pub fn revoke(&mut self, at: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(at);
        true
    }

    /// Time remaining until expiration, zero once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

/// A refresh token that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub subject_id: String,
    pub family_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewRefreshToken {
    /// First token of a new session family
    pub fn family_root(
        subject_id: impl Into<String>,
        token_hash: String,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            token_hash,
            subject_id: subject_id.into(),
            family_id: Uuid::new_v4(),
            parent_id: None,
            created_at,
            expires_at: expiry_after(created_at, ttl),
        }
    }

    /// Token replacing `previous` in the same family
    pub fn successor(
        previous: &RefreshTokenRecord,
        token_hash: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token_hash,
            subject_id: previous.subject_id.clone(),
            family_id: previous.family_id,
            parent_id: Some(previous.id),
            created_at,
            expires_at,
        }
    }

    /// Materialises the record under the identifier chosen by the store
    pub fn into_record(self, id: Uuid) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id,
            token_hash: self.token_hash,
            subject_id: self.subject_id,
            family_id: self.family_id,
            parent_id: self.parent_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
            revoked: false,
            revoked_at: None,
        }
    }
}

/// A freshly minted refresh token together with its stored record
///
/// `token` is the only copy of the raw value; hand it to the client and drop it.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Raw token value for the client
    pub token: String,

    /// Persisted record
    pub record: RefreshTokenRecord,
}

impl IssuedToken {
    pub fn subject_id(&self) -> &str {
        &self.record.subject_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.record.expires_at
    }

    /// Seconds until expiry, for an `expires_in` response field
    pub fn expires_in(&self) -> i64 {
        self.record.time_until_expiration(Utc::now()).num_seconds()
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("record", &self.record)
            .finish()
    }
}
