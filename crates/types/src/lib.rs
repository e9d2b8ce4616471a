//! Core types and traits for the hlbridge workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! bridge: the per-location token record, the unified error type, and the
//! async storage trait that each backend implements.

pub mod error;
pub mod token;
pub mod traits;

pub use error::HlError;
pub use token::{IssuedAtPolicy, TokenRecord, TokenUpdate, is_expired};
pub use traits::{Clock, SystemClock, TokenStore};
