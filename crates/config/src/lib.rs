//! Configuration loading for the hlbridge server.
//!
//! Uses figment to merge built-in defaults, an optional YAML file and the
//! process environment.

pub mod schema;

pub use schema::Config;
