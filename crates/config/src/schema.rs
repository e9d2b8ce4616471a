use hlbridge_types::{HlError, IssuedAtPolicy};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::PathBuf, time::Duration};

/// Environment variables read without the `HLBRIDGE_` prefix.
const CREDENTIAL_VARS: &[&str] = &["client_id", "client_secret", "redirect_uri"];

/// Prefix for every other environment override (e.g. `HLBRIDGE_PORT`).
const ENV_PREFIX: &str = "HLBRIDGE_";

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_api_base_url() -> String {
    "https://services.leadconnectorhq.com".to_string()
}
fn default_authorize_url() -> String {
    "https://marketplace.gohighlevel.com/oauth/chooselocation".to_string()
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_session_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}
fn default_custom_field_name() -> String {
    "DFS Booking Zoom Link".to_string()
}
fn default_custom_field_value() -> String {
    "TEST".to_string()
}

/// Top-level application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 8000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    /// `SQLite` database path. `None` selects `~/.hlbridge/tokens.db`.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// OAuth application client id (`CLIENT_ID`).
    #[serde(default)]
    pub client_id: String,
    /// OAuth application client secret (`CLIENT_SECRET`).
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URI registered with the marketplace app (`REDIRECT_URI`).
    #[serde(default)]
    pub redirect_uri: String,
    /// Base URL of the CRM REST API, also hosting `/oauth/token`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Hosted "choose location" login page.
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    /// Timeout applied to every outbound HTTP call.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub issued_at_policy: IssuedAtPolicy,
    /// Lifetime of a browser session, also sent as the cookie's `Max-Age`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Name of the custom field written by the update-contact workflow.
    #[serde(default = "default_custom_field_name")]
    pub custom_field_name: String,
    #[serde(default = "default_custom_field_value")]
    pub custom_field_value: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            database: None,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            api_base_url: default_api_base_url(),
            authorize_url: default_authorize_url(),
            http_timeout_secs: default_http_timeout_secs(),
            issued_at_policy: IssuedAtPolicy::default(),
            session_ttl_secs: default_session_ttl_secs(),
            custom_field_name: default_custom_field_name(),
            custom_field_value: default_custom_field_value(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("authorize_url", &self.authorize_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("issued_at_policy", &self.issued_at_policy)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("custom_field_name", &self.custom_field_name)
            .field("custom_field_value", &self.custom_field_value)
            .finish()
    }
}

impl Config {
    fn base() -> figment::Figment {
        use figment::{Figment, providers::Serialized};
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn with_env(figment: figment::Figment) -> figment::Figment {
        use figment::providers::Env;
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(CREDENTIAL_VARS))
    }

    /// Credential entries of `./.env`, keyed by config field. A missing file yields none.
    ///
    /// Only `CLIENT_ID`, `CLIENT_SECRET` and `REDIRECT_URI` are taken; the
    /// process environment is not modified.
    #[allow(clippy::result_large_err)]
    fn dotenv_credentials() -> Result<BTreeMap<String, String>, figment::Error> {
        let path = std::env::current_dir()
            .map_err(|e| figment::Error::from(format!("cannot resolve working directory: {e}")))?
            .join(".env");
        let entries = match dotenvy::from_path_iter(&path) {
            Ok(entries) => entries,
            Err(e) if e.not_found() => return Ok(BTreeMap::new()),
            Err(e) => return Err(format!("cannot read {}: {e}", path.display()).into()),
        };

        let mut credentials = BTreeMap::new();
        for entry in entries {
            let (key, value) =
                entry.map_err(|e| figment::Error::from(format!("invalid entry in {}: {e}", path.display())))?;
            let key = key.to_ascii_lowercase();
            if CREDENTIAL_VARS.contains(&key.as_str()) {
                credentials.insert(key, value);
            }
        }
        tracing::debug!(path = %path.display(), keys = credentials.len(), "loaded .env");
        Ok(credentials)
    }

    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::providers::{Format as _, Yaml};
        Self::base().merge(Yaml::string(yaml)).extract()
    }

    /// Loads configuration from defaults, an optional YAML file, `./.env`, and the environment.
    ///
    /// `CLIENT_ID`, `CLIENT_SECRET` and `REDIRECT_URI` are read unprefixed,
    /// from `.env` or the process environment (which wins); any other key can
    /// be overridden with `HLBRIDGE_<KEY>`.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML or `.env` file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, figment::Error> {
        use figment::providers::{Format as _, Serialized, Yaml};
        let mut figment = Self::base();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Serialized::defaults(Self::dotenv_credentials()?));
        Self::with_env(figment).extract()
    }

    /// Checks that the OAuth client credentials are present.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), HlError> {
        for (name, value) in [
            ("CLIENT_ID", &self.client_id),
            ("CLIENT_SECRET", &self.client_secret),
            ("REDIRECT_URI", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(HlError::Config(format!("{name} is not set")));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(HlError::Config("http_timeout_secs must be positive".into()));
        }
        if self.session_ttl_secs == 0 {
            return Err(HlError::Config("session_ttl_secs must be positive".into()));
        }
        Ok(())
    }

    /// OAuth token endpoint derived from [`Config::api_base_url`].
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.api_base_url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
