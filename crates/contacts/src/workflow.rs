//! Update-contact workflow: write a value into a named custom field of one
//! contact of the location.

use hlbridge_auth::TokenLifecycleManager;
use hlbridge_types::{HlError, traits::Result};
use rand::seq::SliceRandom as _;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{Contact, ContactsClient};

/// Chooses which contact the workflow updates.
pub trait ContactPicker: Send + Sync {
    /// Returns one element of `contacts`, or `None` if it is empty.
    fn pick<'a>(&self, contacts: &'a [Contact]) -> Option<&'a Contact>;
}

/// Uniformly random choice. No seeding or determinism guarantees.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl ContactPicker for RandomPicker {
    fn pick<'a>(&self, contacts: &'a [Contact]) -> Option<&'a Contact> {
        contacts.choose(&mut rand::thread_rng())
    }
}

/// Outcome of a successful update.
#[derive(Debug, Clone, Serialize)]
pub struct ContactUpdate {
    pub contact_id: String,
    pub custom_field_id: String,
    pub custom_field_name: String,
    /// Provider response to the `PUT /contacts/{id}` call.
    pub response: Value,
}

pub struct ContactUpdater {
    auth: Arc<TokenLifecycleManager>,
    client: ContactsClient,
    field_name: String,
    field_value: String,
    picker: Arc<dyn ContactPicker>,
}

impl ContactUpdater {
    #[must_use]
    pub fn new(
        auth: Arc<TokenLifecycleManager>,
        client: ContactsClient,
        field_name: impl Into<String>,
        field_value: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            client,
            field_name: field_name.into(),
            field_value: field_value.into(),
            picker: Arc::new(RandomPicker),
        }
    }

    #[must_use]
    pub fn with_picker(mut self, picker: Arc<dyn ContactPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Picks a contact of the location and sets the configured custom field on it.
    ///
    /// # Errors
    ///
    /// - [`HlError::NotFound`] / [`HlError::Refresh`] if no valid token is available.
    /// - [`HlError::Upstream`] if any CRM call answers with a non-success status.
    /// - [`HlError::Workflow`] if the location has no contacts or lacks the custom field.
    pub async fn update_random_contact(&self, location_id: &str) -> Result<ContactUpdate> {
        let token = self.auth.get_valid_access_token(location_id).await?;

        let contacts = self.client.list_contacts(&token, location_id).await?;
        let contact = self
            .picker
            .pick(&contacts)
            .ok_or_else(|| HlError::Workflow("No contacts found".into()))?;

        let fields = self.client.list_custom_fields(&token, location_id).await?;
        let field = fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| HlError::Workflow(format!("Custom field '{}' not found", self.field_name)))?;

        let response = self
            .client
            .update_contact_custom_field(&token, &contact.id, &field.id, &self.field_value)
            .await?;

        tracing::info!(
            location_id,
            contact_id = %contact.id,
            custom_field_id = %field.id,
            "contact custom field updated"
        );
        Ok(ContactUpdate {
            contact_id: contact.id.clone(),
            custom_field_id: field.id.clone(),
            custom_field_name: field.name.clone(),
            response,
        })
    }
}
