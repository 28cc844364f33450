use serde::Deserialize;

use super::workflow::flexible_value;

#[derive(Debug, Deserialize)]
pub struct LoadPageRequest {
    pub url: String,
    /// Page markup; fetched from `url` when absent
    pub html: Option<String>,
    /// Whether the page's router reports route changes itself
    #[serde(default)]
    pub routing_hook: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserEventKind {
    Click,
    Input,
    Back,
    Forward,
}

/// A user interaction relayed by the host into the page
#[derive(Debug, Deserialize)]
pub struct UserEventRequest {
    #[serde(rename = "type")]
    pub kind: UserEventKind,
    pub selector: Option<String>,
    #[serde(default, deserialize_with = "flexible_value")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    Push,
    Replace,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub mode: HistoryMode,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RouteChangeRequest {
    pub url: String,
}
