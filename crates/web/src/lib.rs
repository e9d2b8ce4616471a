//! HTTP front door: axum router, route handlers, sessions and error pages.
//!
//! Routes the OAuth login flow (`/login`, the `/` callback), a dashboard
//! showing the session's token, and the update-contact page.

mod error;
mod handlers;
pub mod pages;
pub mod session;

pub use error::PageError;
pub use session::SessionStore;

use axum::{Router, routing::get};
use hlbridge_auth::TokenLifecycleManager;
use hlbridge_config::Config;
use hlbridge_contacts::{ContactUpdater, ContactsClient};
use hlbridge_types::HlError;
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

/// Shared application state passed to all route handlers.
pub struct AppState {
    pub config: Arc<Config>,
    /// Token lifecycle for every location that has logged in.
    pub auth: Arc<TokenLifecycleManager>,
    pub contacts: ContactUpdater,
    /// Browser sessions, keyed by the `hl_session` cookie.
    pub sessions: SessionStore,
}

impl AppState {
    /// Creates the shared state wrapped in an `Arc`.
    ///
    /// The contacts client talks to `config.api_base_url` through `http`.
    pub fn new(
        config: Arc<Config>,
        auth: Arc<TokenLifecycleManager>,
        http: reqwest::Client,
    ) -> Arc<Self> {
        let client = ContactsClient::new(http, config.api_base_url.clone());
        let contacts = ContactUpdater::new(
            Arc::clone(&auth),
            client,
            config.custom_field_name.clone(),
            config.custom_field_value.clone(),
        );
        Self::with_updater(config, auth, contacts)
    }

    /// Same as [`new`](Self::new) with a prebuilt contact updater.
    pub fn with_updater(
        config: Arc<Config>,
        auth: Arc<TokenLifecycleManager>,
        contacts: ContactUpdater,
    ) -> Arc<Self> {
        let sessions = SessionStore::new(config.session_ttl());
        Arc::new(Self {
            config,
            auth,
            contacts,
            sessions,
        })
    }
}

/// Build the HTTP client used for every outbound call, with a per-request timeout.
///
/// # Errors
///
/// Returns [`HlError::Http`] if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, HlError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Build the full axum router.
///
/// Routes:
/// - GET /                 OAuth callback (`?code=…`)
/// - GET /login            redirect to the hosted login page
/// - GET /dashboard
/// - GET /update-contact
/// - GET /healthz
pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::callback))
        .route("/login", get(handlers::login))
        .route("/dashboard", get(handlers::dashboard))
        .route("/update-contact", get(handlers::update_contact))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use hlbridge_auth::OAuthClientConfig;
    use hlbridge_store::InMemoryTokenStore;
    use hlbridge_types::{Clock as _, SystemClock, TokenStore, TokenUpdate};
    use http_body_util::BodyExt as _;
    use serde_json::json;
    use tower::ServiceExt as _;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        state: Arc<AppState>,
        store: Arc<InMemoryTokenStore>,
    }

    fn harness(server: &MockServer) -> Harness {
        let mut config = Config::from_yaml(
            "client_id: cid\nclient_secret: secret\nredirect_uri: http://localhost:8000/",
        )
        .unwrap();
        config.api_base_url = server.uri();
        config.authorize_url = format!("{}/oauth/chooselocation", server.uri());

        let store = Arc::new(InMemoryTokenStore::new());
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        let auth = Arc::new(TokenLifecycleManager::new(
            OAuthClientConfig::from_config(&config),
            Arc::clone(&store) as Arc<dyn TokenStore>,
            http.clone(),
        ));
        Harness {
            state: AppState::new(Arc::new(config), auth, http),
            store,
        }
    }

    async fn seed_token(store: &InMemoryTokenStore, location_id: &str, issued_at: i64) {
        store
            .upsert(
                location_id,
                &TokenUpdate {
                    access_token: "stored-at".into(),
                    refresh_token: Some("stored-rt".into()),
                    expires_in: 3600,
                    issued_at,
                    reset_issued_at: false,
                },
            )
            .await
            .unwrap();
    }

    async fn get(state: &Arc<AppState>, uri: &str, session: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri);
        if let Some(id) = session {
            req = req.header(header::COOKIE, format!("hl_session={id}"));
        }
        make_router(Arc::clone(state))
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(resp: &Response) -> Option<&str> {
        resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_healthz() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let resp = get(&h.state, "/healthz", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }

    #[tokio::test]
    async fn test_login_redirects_to_hosted_page() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let resp = get(&h.state, "/login", None).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        let url = location(&resp).unwrap();
        assert!(url.starts_with(&format!("{}/oauth/chooselocation?", server.uri())));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_callback_without_code() {
        let server = MockServer::start().await;
        let h = harness(&server);
        for uri in ["/", "/?code="] {
            let resp = get(&h.state, uri, None).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body = body_text(resp).await;
            assert!(body.contains("Authorization code not found, please login"));
            assert!(body.contains("href=\"/login\""));
        }
    }

    #[tokio::test]
    async fn test_callback_then_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("code=good-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 86399,
                "locationId": "loc-1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server);

        let resp = get(&h.state, "/?code=good-code", None).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Some("/dashboard"));
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=1209600"));
        let session_id = cookie
            .split(';')
            .next()
            .and_then(|kv| kv.strip_prefix("hl_session="))
            .unwrap();

        let resp = get(&h.state, "/dashboard", Some(session_id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("loc-1"));
        assert!(body.contains("at-1"));
    }

    #[tokio::test]
    async fn test_callback_exchange_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;
        let h = harness(&server);

        let resp = get(&h.state, "/?code=bad", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let body = body_text(resp).await;
        assert!(body.contains("Failed to authorize"));
        assert!(body.contains("invalid_grant"));
        assert!(h.store.list_locations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_without_session() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let resp = get(&h.state, "/dashboard", None).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Some("/login"));

        let resp = get(&h.state, "/dashboard", Some("forged")).await;
        assert_eq!(location(&resp), Some("/login"));
    }

    #[tokio::test]
    async fn test_dashboard_session_without_token() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let session_id = h.state.sessions.create("loc-gone");
        let resp = get(&h.state, "/dashboard", Some(&session_id)).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Some("/login"));
    }

    #[tokio::test]
    async fn test_dashboard_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("refresh token revoked"))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server);
        seed_token(&h.store, "loc-1", 0).await;
        let session_id = h.state.sessions.create("loc-1");

        let resp = get(&h.state, "/dashboard", Some(&session_id)).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_text(resp).await;
        assert!(body.contains("Failed to refresh token"));
        assert!(body.contains("refresh token revoked"));
        assert!(!body.contains("stored-at"));
    }

    #[tokio::test]
    async fn test_update_contact_not_logged_in() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let resp = get(&h.state, "/update-contact", None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(resp).await.contains("Not logged in"));
    }

    #[tokio::test]
    async fn test_update_contact_no_token() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let session_id = h.state.sessions.create("loc-1");
        let resp = get(&h.state, "/update-contact", Some(&session_id)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("No token found"));
    }

    #[tokio::test]
    async fn test_update_contact_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"contacts": [{"id": "c-1"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/loc-1/customFields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customFields": [{"id": "f-1", "name": "DFS Booking Zoom Link"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/contacts/c-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeded": true})))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server);
        seed_token(&h.store, "loc-1", SystemClock.now()).await;
        let session_id = h.state.sessions.create("loc-1");

        let resp = get(&h.state, "/update-contact", Some(&session_id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Contact updated"));
        assert!(body.contains("c-1"));
        assert!(body.contains("f-1"));
    }

    #[tokio::test]
    async fn test_update_contact_no_contacts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contacts": []})))
            .mount(&server)
            .await;
        let h = harness(&server);
        seed_token(&h.store, "loc-1", SystemClock.now()).await;
        let session_id = h.state.sessions.create("loc-1");

        let resp = get(&h.state, "/update-contact", Some(&session_id)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(resp).await.contains("No contacts found"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(30)).is_ok());
    }
}
