//! Route handlers for the login flow, dashboard and update-contact page.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use hlbridge_types::HlError;
use serde::Deserialize;
use std::sync::Arc;

use crate::{AppState, error::PageError, pages};

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// GET /login: send the browser to the hosted login page.
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response, PageError> {
    let url = state.auth.authorization_url()?;
    Ok(found(&url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
}

/// GET /?code=…: OAuth redirect target.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, PageError> {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(PageError::new(
            StatusCode::BAD_REQUEST,
            "Authorization code not found, please login",
        )
        .with_login_link());
    };

    let record = state.auth.exchange_code(&code).await?;
    let session_id = state.sessions.create(&record.location_id);
    tracing::info!(location_id = %record.location_id, "session opened");

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/dashboard".to_string()),
            (header::SET_COOKIE, state.sessions.cookie(&session_id)),
        ],
    )
        .into_response())
}

/// GET /dashboard: show the session's location and a valid access token.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let Some(location_id) = state.sessions.location_from_headers(&headers) else {
        return Ok(found("/login"));
    };
    match state.auth.get_valid_access_token(&location_id).await {
        Ok(token) => Ok(pages::dashboard(&location_id, &token).into_response()),
        Err(HlError::NotFound(_)) => Ok(found("/login")),
        Err(e) => Err(e.into()),
    }
}

/// GET /update-contact: run the update-contact workflow for the session's location.
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let location_id = state
        .sessions
        .location_from_headers(&headers)
        .ok_or_else(PageError::not_logged_in)?;

    let update = state.contacts.update_random_contact(&location_id).await?;
    Ok(pages::contact_updated(&update))
}

pub async fn healthz() -> &'static str {
    "ok"
}
