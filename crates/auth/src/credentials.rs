//! OAuth app credentials and endpoints passed into the lifecycle manager.

use hlbridge_config::Config;
use hlbridge_types::IssuedAtPolicy;
use secrecy::SecretString;

use crate::highlevel;

/// Client credentials and endpoint URLs for the marketplace OAuth app.
#[derive(Debug)]
pub struct OAuthClientConfig {
    /// OAuth 2.0 client ID.
    pub client_id: String,
    /// OAuth 2.0 client secret.
    pub client_secret: SecretString,
    /// Redirect URI registered with the app; sent on every token request.
    pub redirect_uri: String,
    /// Token endpoint (`POST`, form-encoded).
    pub token_url: String,
    /// Hosted login page the browser is sent to.
    pub authorize_url: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
    pub issued_at_policy: IssuedAtPolicy,
}

impl OAuthClientConfig {
    /// Builds the client configuration from the loaded application config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: SecretString::from(config.client_secret.clone()),
            redirect_uri: config.redirect_uri.clone(),
            token_url: config.token_url(),
            authorize_url: config.authorize_url.clone(),
            scopes: highlevel::SCOPES.iter().map(ToString::to_string).collect(),
            issued_at_policy: config.issued_at_policy,
        }
    }
}
