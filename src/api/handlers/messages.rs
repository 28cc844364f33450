use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::Result;
use crate::models::MessageResponse;

use super::super::state::AppState;

/// Deliver a control message to a page. Failures of the message itself come
/// back as `{ ok: false, error }` with status 200.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(message): Json<serde_json::Value>,
) -> Result<Json<MessageResponse>> {
    let handle = state.page(&page_id)?;
    let mut page = handle.page.lock().await;
    let seen = page.submissions().len();

    let response = handle.dispatcher.dispatch_json(&mut page, message);

    state.publish_submissions(&page_id, &page, seen);
    Ok(Json(response))
}
