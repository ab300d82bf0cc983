use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::Redirect,
};

use crate::api::error::ApiError;
use crate::session::token_from_headers;
use crate::AppState;

/// The caller's live session, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub username: String,
}

pub fn current_session(headers: &HeaderMap, state: &AppState) -> Option<CurrentSession> {
    let token = token_from_headers(headers)?;
    let username = state.sessions.username(&token)?;
    Some(CurrentSession { token, username })
}

/// Session guard for JSON endpoints: rejects with 401.
pub struct ApiSession(pub CurrentSession);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ApiSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        current_session(&parts.headers, state).map(ApiSession).ok_or(ApiError::Auth)
    }
}

/// Session guard for HTML pages: redirects to the login form.
pub struct PageSession(pub CurrentSession);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for PageSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        current_session(&parts.headers, state).map(PageSession).ok_or_else(|| Redirect::to("/login"))
    }
}
