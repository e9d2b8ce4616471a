//! Per-location OAuth token record and expiry logic.

use serde::{Deserialize, Serialize};

/// OAuth credentials stored for a single location (tenant).
///
/// At most one record exists per `location_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub location_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Validity of `access_token` in seconds, counted from `issued_at`.
    pub expires_in: i64,
    /// Unix timestamp (seconds) the current validity window starts at.
    pub issued_at: i64,
}

impl TokenRecord {
    /// Unix timestamp (seconds) after which the access token is stale.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.issued_at.saturating_add(self.expires_in)
    }

    /// Shorthand for [`is_expired`] on this record.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        is_expired(self, now)
    }
}

/// Returns `true` once `now` is strictly past `issued_at + expires_in`.
///
/// Exact boundary comparison: no grace period or clock-skew margin.
#[must_use]
pub fn is_expired(record: &TokenRecord, now: i64) -> bool {
    now > record.expires_at()
}

/// How a successful exchange or refresh treats an existing record's `issued_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuedAtPolicy {
    /// Restart the validity window at the time of every exchange or refresh.
    #[default]
    Reset,
    /// Keep the timestamp from when the record was first created, so expiry
    /// is computed from the original grant plus the newest `expires_in`.
    Preserve,
}

impl IssuedAtPolicy {
    #[must_use]
    pub fn resets(self) -> bool {
        matches!(self, Self::Reset)
    }
}

/// Fields written by a [`TokenStore::upsert`](crate::TokenStore::upsert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    pub access_token: String,
    /// `None` keeps the stored refresh token; a new record gets an empty one.
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    /// Issuance time stamped on a newly created record.
    pub issued_at: i64,
    /// Whether an existing record's `issued_at` is overwritten as well.
    pub reset_issued_at: bool,
}

impl TokenUpdate {
    /// Applies this update to `record` in place, with upsert semantics.
    pub fn apply_to(&self, record: &mut TokenRecord) {
        record.access_token.clone_from(&self.access_token);
        if let Some(refresh_token) = &self.refresh_token {
            record.refresh_token.clone_from(refresh_token);
        }
        record.expires_in = self.expires_in;
        if self.reset_issued_at {
            record.issued_at = self.issued_at;
        }
    }

    /// Builds the record created when no row exists yet for `location_id`.
    #[must_use]
    pub fn into_record(self, location_id: impl Into<String>) -> TokenRecord {
        TokenRecord {
            location_id: location_id.into(),
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            expires_in: self.expires_in,
            issued_at: self.issued_at,
        }
    }
}
