//! Page error type that maps [`HlError`] variants to HTTP status codes and HTML error pages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hlbridge_types::HlError;

use crate::pages;

/// An HTML error page with its status code.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    title: String,
    detail: Option<String>,
    login_link: bool,
}

impl PageError {
    #[must_use]
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: None,
            login_link: false,
        }
    }

    #[must_use]
    pub fn with_login_link(mut self) -> Self {
        self.login_link = true;
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Error page for a request without a session.
    #[must_use]
    pub fn not_logged_in() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not logged in").with_login_link()
    }
}

/// Returns `(status, title, login_link)` for an error.
fn classify(err: &HlError) -> (StatusCode, &'static str, bool) {
    match err {
        HlError::Authorization { .. } => (StatusCode::BAD_GATEWAY, "Failed to authorize", true),
        HlError::NotFound(_) => (StatusCode::NOT_FOUND, "No token found", true),
        HlError::Refresh { .. } => (StatusCode::BAD_GATEWAY, "Failed to refresh token", true),
        HlError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "CRM request failed", false),
        HlError::Http(_) => (StatusCode::BAD_GATEWAY, "Provider unreachable", false),
        HlError::Workflow(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Could not update contact", false),
        HlError::Serialization(_) | HlError::Storage(_) | HlError::Config(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error", false)
        }
    }
}

impl From<HlError> for PageError {
    fn from(err: HlError) -> Self {
        let (status, title, login_link) = classify(&err);
        Self {
            status,
            title: title.to_string(),
            detail: Some(err.to_string()),
            login_link,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), title = %self.title, "request failed");
        } else {
            tracing::warn!(status = self.status.as_u16(), title = %self.title, "request failed");
        }
        let page = pages::error(&self.title, self.detail.as_deref(), self.login_link);
        (self.status, page).into_response()
    }
}
