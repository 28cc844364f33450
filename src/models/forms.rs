use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormDescriptor {
    pub id: String,
    pub selector: String,
    pub action: String,
    pub method: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: String,
    pub label: String,
    pub required: bool,
    pub selector: String,
    pub placeholder: String,
    /// Checkbox and radio inputs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Select elements only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormEntry {
    pub name: String,
    pub value: String,
}

/// A form submission performed by the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub form: String,
    pub action: String,
    pub method: String,
    pub entries: Vec<FormEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    pub fn entry(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageContent {
    pub title: String,
    pub url: String,
    pub text: String,
    pub description: String,
}
