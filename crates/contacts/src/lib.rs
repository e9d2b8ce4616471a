//! Downstream CRM calls made on behalf of a location.
//!
//! [`ContactsClient`] wraps the contacts and custom-field endpoints;
//! [`ContactUpdater`] runs the update-contact workflow on top of it.

pub mod client;
pub mod workflow;

pub use client::{API_VERSION, Contact, ContactsClient, CustomField};
pub use workflow::{ContactPicker, ContactUpdate, ContactUpdater, RandomPicker};
