use serde_json::Value;

use crate::content::{extract_page_content, DEFAULT_MAX_TEXT_CHARS};
use crate::forms::{fill_field, introspect_forms, submit_form};
use crate::models::{ControlMessage, MessageResponse, ResponsePayload};
use crate::page::Page;
use crate::recording::Recorder;
use crate::replay::replay_steps;

const KNOWN_ACTIONS: &[&str] = &[
    "startRecording",
    "stopRecording",
    "getPageContent",
    "getFormFields",
    "fillFormField",
    "submitForm",
    "replaySteps",
];

/// Routes control messages from the host to the page components.
/// Every message gets a `{ ok, ... }` reply; nothing here panics or errors out.
pub struct MessageDispatcher {
    recorder: Recorder,
    max_text_chars: usize,
}

impl MessageDispatcher {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn dispatch(&self, page: &mut Page, message: ControlMessage) -> MessageResponse {
        tracing::debug!("Dispatching {}", message.tag());

        match message {
            ControlMessage::StartRecording => {
                if !self.recorder.start(page) {
                    tracing::debug!("startRecording ignored, already recording");
                }
                MessageResponse::empty()
            }
            ControlMessage::StopRecording => MessageResponse::ok(ResponsePayload::Steps {
                steps: self.recorder.stop(page),
            }),
            ControlMessage::GetPageContent => MessageResponse::ok(ResponsePayload::Content(
                extract_page_content(page, self.max_text_chars),
            )),
            ControlMessage::GetFormFields => MessageResponse::ok(ResponsePayload::Forms {
                forms: introspect_forms(page),
                page_url: page.url().to_string(),
            }),
            ControlMessage::FillFormField { selector, value } => {
                match fill_field(page, &selector, &value) {
                    Ok(filled) => MessageResponse::ok(ResponsePayload::Filled { filled }),
                    Err(e) => {
                        tracing::warn!("fillFormField failed: {}", e);
                        MessageResponse::error(e.to_string())
                    }
                }
            }
            ControlMessage::SubmitForm { selector } => match submit_form(page, &selector) {
                Ok(action) => MessageResponse::ok(ResponsePayload::Submitted {
                    submitted: true,
                    action,
                }),
                Err(e) => {
                    tracing::warn!("submitForm failed: {}", e);
                    MessageResponse::error(e.to_string())
                }
            },
            ControlMessage::ReplaySteps { steps } => MessageResponse::ok(ResponsePayload::Replayed {
                report: replay_steps(page, &steps),
            }),
        }
    }

    /// Parse a raw JSON message and dispatch it
    pub fn dispatch_json(&self, page: &mut Page, message: Value) -> MessageResponse {
        let action = message
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string);

        match serde_json::from_value::<ControlMessage>(message) {
            Ok(message) => self.dispatch(page, message),
            Err(e) => {
                let error = match action {
                    None => "Missing action".to_string(),
                    Some(action) if !KNOWN_ACTIONS.contains(&action.as_str()) => {
                        format!("Unknown action: {}", action)
                    }
                    Some(action) => format!("Invalid {} message: {}", action, e),
                };
                tracing::warn!("Rejected control message: {}", error);
                MessageResponse::error(error)
            }
        }
    }
}
