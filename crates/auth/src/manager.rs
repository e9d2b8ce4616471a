//! Token lifecycle for GoHighLevel locations.
//!
//! Responsibilities:
//! - Exchange an authorization code for tokens and upsert them per location.
//! - Detect expiry (exact boundary, no skew margin).
//! - Refresh expired tokens with the refresh-token grant.
//!
//! No retries: a transport failure or non-200 response ends the call.
use hlbridge_types::{
    Clock, HlError, SystemClock, TokenRecord, TokenStore, TokenUpdate, is_expired,
    traits::Result,
};
use reqwest::StatusCode;
use std::sync::Arc;

use crate::{
    OAuthClientConfig,
    highlevel::{self, TokenGrant},
};

/// Exchanges, checks and refreshes OAuth tokens for locations.
pub struct TokenLifecycleManager {
    client: OAuthClientConfig,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl TokenLifecycleManager {
    pub fn new(client: OAuthClientConfig, store: Arc<dyn TokenStore>, http: reqwest::Client) -> Self {
        Self {
            client,
            store,
            http,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock used for expiry checks and issuance stamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The store tokens are persisted in.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Hosted login URL that starts the authorization-code flow.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Config`] if the URL cannot be encoded.
    pub fn authorization_url(&self) -> Result<String> {
        highlevel::build_auth_url(&self.client)
            .map_err(|e| HlError::Config(format!("cannot build authorization url: {e}")))
    }

    /// Exchange a one-time authorization code and store the resulting tokens.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Authorization`] with the raw provider body if the
    /// provider does not answer 200 with an `access_token` and `locationId`;
    /// the store is left untouched in that case.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord> {
        let params = highlevel::authorization_code_params(&self.client, code);
        let (status, body) = self.post_token(&params).await?;

        let grant = Self::successful_grant(status, &body);
        let Some((grant, location_id)) =
            grant.and_then(|g| g.location_id.clone().map(|loc| (g, loc)))
        else {
            tracing::warn!(status = status.as_u16(), "authorization code exchange rejected");
            return Err(HlError::Authorization {
                status: status.as_u16(),
                body,
            });
        };

        let update = self.update_from_grant(grant);
        let record = self.store.upsert(&location_id, &update).await?;
        tracing::info!(location_id = %location_id, expires_in = record.expires_in, "location authorized");
        Ok(record)
    }

    /// `true` if `record` is stale according to the manager's clock.
    #[must_use]
    pub fn is_expired(&self, record: &TokenRecord) -> bool {
        is_expired(record, self.clock.now())
    }

    /// Return a usable access token for the location, refreshing it if expired.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::NotFound`] if the location has no stored token, or
    /// the error from [`refresh`](Self::refresh) if the token is expired and
    /// cannot be renewed. A stale token is never returned.
    pub async fn get_valid_access_token(&self, location_id: &str) -> Result<String> {
        let record = self
            .store
            .get_by_location(location_id)
            .await?
            .ok_or_else(|| HlError::NotFound(location_id.to_string()))?;

        if self.is_expired(&record) {
            tracing::debug!(location_id, expires_at = record.expires_at(), "access token expired");
            return Ok(self.refresh(&record).await?.access_token);
        }
        Ok(record.access_token)
    }

    /// Mint a new access token with the record's refresh token and persist it.
    ///
    /// If the provider does not rotate the refresh token, the stored one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Refresh`] carrying the provider body on a non-200
    /// answer or a 200 without `access_token`; the stored record is unchanged.
    /// A transport failure is reported as `Refresh` with status `0` and the
    /// transport error text as body.
    pub async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord> {
        let params = highlevel::refresh_params(&self.client, &record.refresh_token);
        let (status, body) = self.post_token(&params).await.map_err(|e| match e {
            HlError::Http(text) => {
                tracing::warn!(location_id = %record.location_id, error = %text, "token refresh unreachable");
                HlError::Refresh {
                    location_id: record.location_id.clone(),
                    status: 0,
                    body: text,
                }
            }
            other => other,
        })?;

        let Some(grant) = Self::successful_grant(status, &body) else {
            tracing::warn!(
                location_id = %record.location_id,
                status = status.as_u16(),
                "token refresh rejected"
            );
            return Err(HlError::Refresh {
                location_id: record.location_id.clone(),
                status: status.as_u16(),
                body,
            });
        };

        let update = self.update_from_grant(grant);
        let refreshed = self.store.upsert(&record.location_id, &update).await?;
        tracing::info!(location_id = %record.location_id, expires_in = refreshed.expires_in, "access token refreshed");
        Ok(refreshed)
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<(StatusCode, String)> {
        let resp = self
            .http
            .post(&self.client.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }

    /// Parses `body` only when the provider answered exactly 200.
    fn successful_grant(status: StatusCode, body: &str) -> Option<TokenGrant> {
        if status != StatusCode::OK {
            return None;
        }
        let json: serde_json::Value = serde_json::from_str(body).ok()?;
        highlevel::parse_token_response(&json)
    }

    /// A grant without `refresh_token` leaves the stored one in place.
    fn update_from_grant(&self, grant: TokenGrant) -> TokenUpdate {
        TokenUpdate {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
            issued_at: self.clock.now(),
            reset_issued_at: self.client.issued_at_policy.resets(),
        }
    }
}
