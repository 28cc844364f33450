use serde::{Deserialize, Serialize};

use super::forms::{FormDescriptor, PageContent};
use super::session::ReplayReport;
use super::workflow::{flexible_string, WorkflowStep};

/// Control message from the host, tagged by `action`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    StartRecording,
    StopRecording,
    GetPageContent,
    GetFormFields,
    FillFormField {
        selector: String,
        #[serde(deserialize_with = "flexible_string")]
        value: String,
    },
    SubmitForm {
        selector: String,
    },
    ReplaySteps {
        steps: Vec<WorkflowStep>,
    },
}

impl ControlMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            ControlMessage::StartRecording => "startRecording",
            ControlMessage::StopRecording => "stopRecording",
            ControlMessage::GetPageContent => "getPageContent",
            ControlMessage::GetFormFields => "getFormFields",
            ControlMessage::FillFormField { .. } => "fillFormField",
            ControlMessage::SubmitForm { .. } => "submitForm",
            ControlMessage::ReplaySteps { .. } => "replaySteps",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilledField {
    pub selector: String,
    pub value: String,
}

/// `{ ok, ... }` reply to a control message
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResponsePayload {
    Empty {},
    Steps {
        steps: Vec<WorkflowStep>,
    },
    Content(PageContent),
    Forms {
        forms: Vec<FormDescriptor>,
        #[serde(rename = "pageUrl")]
        page_url: String,
    },
    Filled {
        filled: FilledField,
    },
    Submitted {
        submitted: bool,
        action: String,
    },
    Replayed {
        report: ReplayReport,
    },
    Error {
        error: String,
    },
}

impl MessageResponse {
    pub fn ok(payload: ResponsePayload) -> Self {
        Self { ok: true, payload }
    }

    pub fn empty() -> Self {
        Self::ok(ResponsePayload::Empty {})
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: ResponsePayload::Error {
                error: error.into(),
            },
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.payload {
            ResponsePayload::Error { error } => Some(error),
            _ => None,
        }
    }
}
