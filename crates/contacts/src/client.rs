//! Contacts and custom-field endpoints of the CRM REST API.
//!
//! Every request carries the bearer token and the pinned `Version` header.

use hlbridge_types::{HlError, traits::Result};
use reqwest::{Client, RequestBuilder, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// API version pinned on every request.
pub const API_VERSION: &str = "2021-07-28";

/// A contact as listed by `GET /contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A location-level custom field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
}

#[derive(Deserialize)]
struct ContactsPage {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomFieldsPage {
    #[serde(default)]
    custom_fields: Vec<CustomField>,
}

/// Thin client over the contacts API.
#[derive(Clone)]
pub struct ContactsClient {
    http: Client,
    base_url: String,
}

impl ContactsClient {
    /// Creates a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Lists the contacts of a location.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Upstream`] on a non-success status, or a transport/parse error.
    pub async fn list_contacts(&self, access_token: &str, location_id: &str) -> Result<Vec<Contact>> {
        let url = format!("{}/contacts", self.base_url);
        let req = Self::authed(self.http.get(url), access_token).query(&[("locationId", location_id)]);
        let page: ContactsPage = Self::send(req).await?.json().await?;
        Ok(page.contacts)
    }

    /// Lists the custom field definitions of a location.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Upstream`] on a non-success status, or a transport/parse error.
    pub async fn list_custom_fields(
        &self,
        access_token: &str,
        location_id: &str,
    ) -> Result<Vec<CustomField>> {
        let url = format!("{}/locations/{location_id}/customFields", self.base_url);
        let req = Self::authed(self.http.get(url), access_token);
        let page: CustomFieldsPage = Self::send(req).await?.json().await?;
        Ok(page.custom_fields)
    }

    /// Sets one custom field on a contact and returns the provider's JSON answer.
    ///
    /// # Errors
    ///
    /// Returns [`HlError::Upstream`] on a non-success status, or a transport/parse error.
    pub async fn update_contact_custom_field(
        &self,
        access_token: &str,
        contact_id: &str,
        field_id: &str,
        value: &str,
    ) -> Result<Value> {
        let url = format!("{}/contacts/{contact_id}", self.base_url);
        let body = json!({ "customFields": [{ "id": field_id, "value": value }] });
        let req = Self::authed(self.http.put(url), access_token).json(&body);
        let resp = Self::send(req).await?;
        Ok(resp.json().await?)
    }

    fn authed(builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .bearer_auth(access_token)
            .header("Version", API_VERSION)
            .header(header::ACCEPT, "application/json")
    }

    /// Sends a request and checks for success status.
    ///
    /// On non-2xx responses, reads the body text and returns [`HlError::Upstream`].
    async fn send(builder: RequestBuilder) -> Result<reqwest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "crm api call failed");
            Err(HlError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_contacts_sends_headers_and_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(query_param("locationId", "loc-1"))
            .and(header_eq("authorization", "Bearer tok"))
            .and(header_eq("version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contacts": [
                    {"id": "c-1", "firstName": "Ada", "email": "ada@example.com"},
                    {"id": "c-2"}
                ],
                "meta": {"total": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ContactsClient::new(Client::new(), server.uri());
        let contacts = client.list_contacts("tok", "loc-1").await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].first_name.as_deref(), Some("Ada"));
        assert_eq!(contacts[1].id, "c-2");
    }

    #[tokio::test]
    async fn test_list_contacts_missing_key_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = ContactsClient::new(Client::new(), server.uri());
        assert!(client.list_contacts("tok", "loc-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_contacts_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid JWT"))
            .mount(&server)
            .await;

        let client = ContactsClient::new(Client::new(), server.uri());
        let err = client.list_contacts("tok", "loc-1").await.unwrap_err();
        assert!(matches!(err, HlError::Upstream { status: 401, ref body } if body == "Invalid JWT"));
    }

    #[tokio::test]
    async fn test_list_custom_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/loc-1/customFields"))
            .and(header_eq("version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customFields": [
                    {"id": "f-1", "name": "DFS Booking Zoom Link", "fieldKey": "contact.zoom"},
                    {"id": "f-2", "name": "Other"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ContactsClient::new(Client::new(), format!("{}/", server.uri()));
        let fields = client.list_custom_fields("tok", "loc-1").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field_key.as_deref(), Some("contact.zoom"));
    }

    #[tokio::test]
    async fn test_update_contact_custom_field_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/contacts/c-9"))
            .and(body_json(json!({"customFields": [{"id": "f-1", "value": "TEST"}]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"contact": {"id": "c-9"}, "succeded": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ContactsClient::new(Client::new(), server.uri());
        let resp = client
            .update_contact_custom_field("tok", "c-9", "f-1", "TEST")
            .await
            .unwrap();
        assert_eq!(resp["contact"]["id"], "c-9");
    }
}
