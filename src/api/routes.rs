use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health, interactions, messages, pages};
use super::state::AppState;
use super::websocket::ws_handler;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Local hosts only
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:1420"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:1420"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
            HeaderValue::from_static("tauri://localhost"),
            HeaderValue::from_static("https://tauri.localhost"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Hosted pages
        .route("/pages", get(pages::list_pages).post(pages::load_page))
        .route(
            "/pages/:page_id",
            get(pages::get_page).delete(pages::delete_page),
        )
        .route("/pages/:page_id/submissions", get(pages::list_submissions))
        // Control messages
        .route("/pages/:page_id/message", post(messages::post_message))
        // Relayed interactions
        .route("/pages/:page_id/events", post(interactions::user_event))
        .route("/pages/:page_id/history", post(interactions::history_change))
        .route("/pages/:page_id/route", post(interactions::route_change))
        // WebSocket
        .route("/ws/:client_id", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
