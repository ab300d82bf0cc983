use std::sync::Arc;
use axum::{extract::State, http::{header, HeaderMap, StatusCode}, Form, Json, response::{Html, IntoResponse, Redirect}};
use serde::Deserialize;
use tracing::info;

use crate::api::extract::{current_session, PageSession};
use crate::session::{expired_session_cookie, session_cookie, token_from_headers};
use crate::AppState;

const LOGIN_HTML: &str = include_str!("../../templates/login.html");
const INDEX_HTML: &str = include_str!("../../templates/index.html");
const DASHBOARDS_HTML: &str = include_str!("../../templates/dashboards.html");

const LOGIN_ERROR: &str = "Invalid username or password";

fn render_login(error: Option<&str>) -> Html<String> {
    let block = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, e))
        .unwrap_or_default();
    Html(LOGIN_HTML.replace("{{error}}", &block))
}

fn render_page(template: &str, username: &str) -> Html<String> {
    Html(template.replace("{{username}}", &escape_html(username)))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.stats.uptime_secs(),
        "sessions": state.sessions.len(),
        "detector_url": state.config.detector_url,
        "llm_model": state.config.llm_model,
        "label_font": state.annotator.has_font(),
        "counters": state.stats.snapshot(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn home(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    if current_session(&headers, &state).is_some() {
        Redirect::to("/index")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page() -> Html<String> {
    render_login(None)
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> axum::response::Response {
    if !state.credentials.verify(&form.username, &form.password) {
        info!("Rejected login for {:?}", form.username);
        return render_login(Some(LOGIN_ERROR)).into_response();
    }

    // A fresh login always starts from an empty history.
    if let Some(previous) = token_from_headers(&headers) {
        state.sessions.remove(&previous);
    }
    let token = state.sessions.create(&form.username);
    info!("User {:?} logged in", form.username);
    ([(header::SET_COOKIE, session_cookie(&token))], Redirect::to("/index")).into_response()
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        if let Some(session) = state.sessions.remove(&token) {
            info!("User {:?} logged out", session.username);
        }
    }
    ([(header::SET_COOKIE, expired_session_cookie())], Redirect::to("/login"))
}

pub async fn index_page(PageSession(session): PageSession) -> Html<String> {
    render_page(INDEX_HTML, &session.username)
}

pub async fn dashboards_page(PageSession(session): PageSession) -> Html<String> {
    render_page(DASHBOARDS_HTML, &session.username)
}
