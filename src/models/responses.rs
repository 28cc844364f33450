use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct LoadPageResponse {
    pub page_id: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct PageStatusResponse {
    pub page_id: String,
    pub url: String,
    pub title: String,
    pub recording: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub step_count: usize,
    pub history_length: usize,
    pub routing_hook: bool,
}

#[derive(Debug, Serialize)]
pub struct UserEventResponse {
    pub url: String,
    /// False when a page listener cancelled the interaction
    pub performed: bool,
}

#[derive(Debug, Serialize)]
pub struct GenericResponse {
    pub status: String,
}
