use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{ActuationError, AppError, Result};
use crate::models::{
    HistoryMode, HistoryRequest, RouteChangeRequest, UserEventKind, UserEventRequest,
    UserEventResponse,
};

use super::super::state::AppState;

/// Relay a user interaction (click, typing, back/forward) into the page
pub async fn user_event(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<UserEventRequest>,
) -> Result<Json<UserEventResponse>> {
    let handle = state.page(&page_id)?;
    let mut page = handle.page.lock().await;
    let seen = page.submissions().len();

    let performed = match request.kind {
        UserEventKind::Back => page.go(-1),
        UserEventKind::Forward => page.go(1),
        kind => {
            let selector = request.selector.as_deref().ok_or_else(|| {
                AppError::ValidationError("selector is required for click and input".to_string())
            })?;
            let node = page
                .document()
                .query_selector(selector)
                .map_err(ActuationError::from)?
                .ok_or_else(|| ActuationError::ElementNotFound(selector.to_string()))?;

            if kind == UserEventKind::Click {
                page.click(node, true)
            } else {
                let value = request.value.as_deref().unwrap_or_default();
                page.type_into(node, value).map_err(ActuationError::from)?;
                true
            }
        }
    };

    state.publish_submissions(&page_id, &page, seen);
    Ok(Json(UserEventResponse {
        url: page.url().to_string(),
        performed,
    }))
}

/// Script-driven `history.pushState` / `history.replaceState`
pub async fn history_change(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<HistoryRequest>,
) -> Result<Json<UserEventResponse>> {
    let handle = state.page(&page_id)?;
    let mut page = handle.page.lock().await;
    match request.mode {
        HistoryMode::Push => page.push_state(&request.url),
        HistoryMode::Replace => page.replace_state(&request.url),
    }
    Ok(Json(UserEventResponse {
        url: page.url().to_string(),
        performed: true,
    }))
}

/// Route change reported by the page's router
pub async fn route_change(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
    Json(request): Json<RouteChangeRequest>,
) -> Result<Json<UserEventResponse>> {
    let handle = state.page(&page_id)?;
    let mut page = handle.page.lock().await;
    if !page.has_routing_hook() {
        return Err(AppError::ValidationError(
            "page was loaded without a routing hook".to_string(),
        ));
    }
    page.notify_route_change(&request.url);
    Ok(Json(UserEventResponse {
        url: page.url().to_string(),
        performed: true,
    }))
}
