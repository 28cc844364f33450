use axum::{
    extract::{Path, State},
    Json,
};
use reqwest::Url;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    FormSubmission, GenericResponse, LoadPageRequest, LoadPageResponse, PageStatusResponse,
};
use crate::page::Page;

use super::super::state::{AppState, PageHandle};

/// Load a page from inline HTML, or fetch it when no HTML is given
pub async fn load_page(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoadPageRequest>,
) -> Result<Json<LoadPageResponse>> {
    let url = Url::parse(&request.url)
        .map_err(|e| AppError::ValidationError(format!("invalid url '{}': {}", request.url, e)))?;

    let html = match request.html {
        Some(html) => html,
        None => state
            .loader
            .fetch(url.as_str())
            .await
            .map_err(|e| AppError::FetchError(format!("{:#}", e)))?,
    };

    let mut page = Page::from_html(url.as_str(), &html);
    page.set_routing_hook(request.routing_hook);

    let (url, title) = (page.url().to_string(), page.title());
    let handle = state.insert_page(page);

    Ok(Json(LoadPageResponse {
        page_id: handle.id.clone(),
        url,
        title,
    }))
}

pub async fn list_pages(State(state): State<Arc<AppState>>) -> Json<Vec<PageStatusResponse>> {
    let handles: Vec<Arc<PageHandle>> = state
        .pages
        .iter()
        .map(|entry| Arc::clone(entry.value()))
        .collect();

    let mut pages = Vec::with_capacity(handles.len());
    for handle in handles {
        pages.push(page_status(&handle).await);
    }
    Json(pages)
}

pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> Result<Json<PageStatusResponse>> {
    let handle = state.page(&page_id)?;
    Ok(Json(page_status(&handle).await))
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> Result<Json<GenericResponse>> {
    state.remove_page(&page_id).await?;
    tracing::info!("Closed page {}", page_id);
    Ok(Json(GenericResponse {
        status: "closed".to_string(),
    }))
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<String>,
) -> Result<Json<Vec<FormSubmission>>> {
    let handle = state.page(&page_id)?;
    let page = handle.page.lock().await;
    Ok(Json(page.submissions().to_vec()))
}

async fn page_status(handle: &PageHandle) -> PageStatusResponse {
    let page = handle.page.lock().await;
    let recorder = handle.dispatcher.recorder();
    PageStatusResponse {
        page_id: handle.id.clone(),
        url: page.url().to_string(),
        title: page.title(),
        recording: recorder.is_recording(),
        session_id: recorder.session_id(),
        step_count: recorder.step_count(),
        history_length: page.history().len(),
        routing_hook: page.has_routing_hook(),
    }
}
