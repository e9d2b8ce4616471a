//! GoHighLevel OAuth 2.0 authorization-code flow.
//!
//! Location-level tokens (`user_type=Location`): the token response names the
//! location the user picked on the hosted "choose location" page.

use secrecy::ExposeSecret as _;
use serde_json::Value;

use crate::OAuthClientConfig;

/// OAuth scopes requested during authorization.
pub const SCOPES: &[&str] = &[
    "contacts.readonly",
    "contacts.write",
    "locations/customFields.readonly",
    "locations/customFields.write",
];

/// Token audience requested on every grant.
pub const USER_TYPE: &str = "Location";

/// Build the hosted login URL the browser is redirected to.
///
/// # Errors
///
/// Returns an error if the query string cannot be encoded.
pub fn build_auth_url(
    client: &OAuthClientConfig,
) -> Result<String, serde_urlencoded::ser::Error> {
    let scope = client.scopes.join(" ");
    let query = serde_urlencoded::to_string([
        ("response_type", "code"),
        ("redirect_uri", client.redirect_uri.as_str()),
        ("client_id", client.client_id.as_str()),
        ("scope", scope.as_str()),
    ])?;
    Ok(format!("{}?{query}", client.authorize_url))
}

/// Form parameters for exchanging an authorization code.
#[must_use]
pub fn authorization_code_params<'a>(
    client: &'a OAuthClientConfig,
    code: &'a str,
) -> [(&'static str, &'a str); 6] {
    [
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.expose_secret()),
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", client.redirect_uri.as_str()),
        ("user_type", USER_TYPE),
    ]
}

/// Form parameters for the refresh-token grant.
#[must_use]
pub fn refresh_params<'a>(
    client: &'a OAuthClientConfig,
    refresh_token: &'a str,
) -> [(&'static str, &'a str); 6] {
    [
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.expose_secret()),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("redirect_uri", client.redirect_uri.as_str()),
        ("user_type", USER_TYPE),
    ]
}

/// Fields extracted from a successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds of validity; `0` when the provider omitted it.
    pub expires_in: i64,
    pub location_id: Option<String>,
}

/// Parse the token endpoint JSON response.
///
/// Returns `None` if the response is missing the `access_token` field.
#[must_use]
pub fn parse_token_response(json: &Value) -> Option<TokenGrant> {
    let access_token = json.get("access_token").and_then(Value::as_str)?.to_string();
    let refresh_token = json
        .get("refresh_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    let expires_in = json
        .get("expires_in")
        .and_then(Value::as_i64)
        .unwrap_or_default();
    let location_id = json
        .get("locationId")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(TokenGrant {
        access_token,
        refresh_token,
        expires_in,
        location_id,
    })
}
