use axum::{Router, extract::DefaultBodyLimit, routing::{get, post}};
use std::sync::Arc;
use tower_http::cors::{CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;
use axum::http::Method;
use crate::AppState;
use crate::api::{handlers, handlers_emotion};
use crate::utils::config::MAX_UPLOAD_BYTES;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT]);

    let pages = Router::new()
        .route("/", get(handlers::home))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/logout", get(handlers::logout))
        .route("/index", get(handlers::index_page))
        .route("/dashboards", get(handlers::dashboards_page))
        .route("/health", get(handlers::health));

    let api = Router::new()
        .route("/process-emotion", post(handlers_emotion::process_emotion))
        .route("/get-history", get(handlers_emotion::get_history))
        .route("/clear-history", post(handlers_emotion::clear_history));

    pages
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
