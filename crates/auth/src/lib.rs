//! OAuth token lifecycle for GoHighLevel locations.
//!
//! [`highlevel`] holds the provider-specific URL building, form parameters
//! and response parsing. The [`TokenLifecycleManager`] exchanges codes,
//! detects expiry and refreshes tokens against a [`TokenStore`].
//!
//! [`TokenStore`]: hlbridge_types::TokenStore

pub mod credentials;
pub mod highlevel;
pub mod manager;

pub use credentials::OAuthClientConfig;
pub use manager::TokenLifecycleManager;
