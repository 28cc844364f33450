use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::dispatcher::MessageDispatcher;
use crate::error::AppError;
use crate::models::{FormSubmission, WorkflowStep};
use crate::page::{HttpPageLoader, Page, PageLoader};
use crate::recording::Recorder;

/// WebSocket event types broadcast to clients
#[derive(Debug, Clone)]
pub enum WsEvent {
    RecordingStep {
        page_id: String,
        session_id: String,
        index: usize,
        step: WorkflowStep,
    },
    FormSubmitted {
        page_id: String,
        submission: FormSubmission,
    },
    Pong,
}

/// Connected WebSocket client info
#[derive(Debug)]
pub struct ConnectedClient {
    pub connected_at: Instant,
}

/// A hosted page with its own recorder and dispatcher
pub struct PageHandle {
    pub id: String,
    pub page: Mutex<Page>,
    pub dispatcher: MessageDispatcher,
}

/// Shared application state
pub struct AppState {
    pub config: Config,

    /// Hosted pages: page_id -> handle
    pub pages: DashMap<String, Arc<PageHandle>>,

    /// Connected WebSocket clients: client_id -> client info
    pub connected_clients: DashMap<String, ConnectedClient>,

    /// Total connection count (for metrics)
    connection_count: AtomicUsize,

    /// Broadcast channel for WebSocket events
    pub ws_broadcast: broadcast::Sender<WsEvent>,

    pub loader: Arc<dyn PageLoader>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let loader = Arc::new(HttpPageLoader::new(config.fetch_timeout())?);
        Ok(Self::with_loader(config, loader))
    }

    pub fn with_loader(config: Config, loader: Arc<dyn PageLoader>) -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self {
            config,
            pages: DashMap::new(),
            connected_clients: DashMap::new(),
            connection_count: AtomicUsize::new(0),
            ws_broadcast: tx,
            loader,
        }
    }

    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no receivers)
        let _ = self.ws_broadcast.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.ws_broadcast.subscribe()
    }

    /// Host `page` and forward its recorded steps to WebSocket clients.
    /// Must be called from within the tokio runtime.
    pub fn insert_page(&self, page: Page) -> Arc<PageHandle> {
        let page_id = Uuid::new_v4().to_string();
        let recorder = Recorder::new();
        let dispatcher =
            MessageDispatcher::new(recorder.clone()).with_max_text_chars(self.config.max_text_chars);

        let mut steps = recorder.subscribe_steps();
        let ws_broadcast = self.ws_broadcast.clone();
        let forward_id = page_id.clone();
        tokio::spawn(async move {
            loop {
                match steps.recv().await {
                    Ok(update) => {
                        let _ = ws_broadcast.send(WsEvent::RecordingStep {
                            page_id: forward_id.clone(),
                            session_id: update.session_id,
                            index: update.index,
                            step: update.step,
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Step forwarder for {} skipped {} steps", forward_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Step forwarder for page {} stopped", forward_id);
        });

        let handle = Arc::new(PageHandle {
            id: page_id.clone(),
            page: Mutex::new(page),
            dispatcher,
        });
        self.pages.insert(page_id.clone(), Arc::clone(&handle));
        tracing::info!("Hosting page {} (total: {})", page_id, self.pages.len());
        handle
    }

    pub fn page(&self, page_id: &str) -> Result<Arc<PageHandle>, AppError> {
        self.pages
            .get(page_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::PageNotFound(page_id.to_string()))
    }

    /// Drop a hosted page, stopping any recording on it
    pub async fn remove_page(&self, page_id: &str) -> Result<(), AppError> {
        let (_, handle) = self
            .pages
            .remove(page_id)
            .ok_or_else(|| AppError::PageNotFound(page_id.to_string()))?;
        let mut page = handle.page.lock().await;
        let steps = handle.dispatcher.recorder().stop(&mut page);
        if !steps.is_empty() {
            tracing::info!("Discarded {} recorded steps of closed page {}", steps.len(), page_id);
        }
        Ok(())
    }

    /// Broadcast submissions the page made since it had `seen` of them
    pub fn publish_submissions(&self, page_id: &str, page: &Page, seen: usize) {
        for submission in page.submissions().iter().skip(seen) {
            self.broadcast(WsEvent::FormSubmitted {
                page_id: page_id.to_string(),
                submission: submission.clone(),
            });
        }
    }

    /// Register a WebSocket client connection
    pub fn client_connected(&self, client_id: &str) {
        self.connected_clients.insert(
            client_id.to_string(),
            ConnectedClient {
                connected_at: Instant::now(),
            },
        );
        let count = self.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "Client {} connected (total: {}, active: {})",
            client_id,
            count,
            self.connected_clients.len()
        );
    }

    pub fn client_disconnected(&self, client_id: &str) {
        if let Some((_, client)) = self.connected_clients.remove(client_id) {
            tracing::debug!(
                "Client {} disconnected after {:?} (active: {})",
                client_id,
                client.connected_at.elapsed(),
                self.connected_clients.len()
            );
        }
    }

    /// Get the number of active WebSocket connections
    pub fn active_connection_count(&self) -> usize {
        self.connected_clients.len()
    }
}
