use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Navigate,
    Click,
    Fill,
}

impl StepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::Navigate => "navigate",
            StepAction::Click => "click",
            StepAction::Fill => "fill",
        }
    }
}

/// One recorded user action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub action: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(
        default,
        deserialize_with = "flexible_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl WorkflowStep {
    pub fn navigate(url: impl Into<String>, timestamp: i64) -> Self {
        Self {
            action: StepAction::Navigate,
            selector: None,
            value: None,
            url: Some(url.into()),
            timestamp,
        }
    }

    pub fn click(selector: impl Into<String>, timestamp: i64) -> Self {
        Self {
            action: StepAction::Click,
            selector: Some(selector.into()),
            value: None,
            url: None,
            timestamp,
        }
    }

    pub fn fill(selector: impl Into<String>, value: impl Into<String>, timestamp: i64) -> Self {
        Self {
            action: StepAction::Fill,
            selector: Some(selector.into()),
            value: Some(value.into()),
            url: None,
            timestamp,
        }
    }

    /// Whether this is a fill step targeting `selector`
    pub fn is_fill_for(&self, selector: &str) -> bool {
        self.action == StepAction::Fill && self.selector.as_deref() == Some(selector)
    }
}

/// Accept strings, numbers and booleans for a value field
pub(crate) fn flexible_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

/// Like [`flexible_value`] for required fields
pub(crate) fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
            serde::de::Error::custom("expected a string, number or boolean"),
        ),
        _ => Ok(value_to_string(value).unwrap_or_default()),
    }
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_omits_absent_fields() {
        let step = WorkflowStep::click("#buy", 42);
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({ "action": "click", "selector": "#buy", "timestamp": 42 })
        );

        let step = WorkflowStep::navigate("https://a.test/", 1);
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({ "action": "navigate", "url": "https://a.test/", "timestamp": 1 })
        );
    }

    #[test]
    fn test_numeric_fill_value_is_accepted() {
        let step: WorkflowStep =
            serde_json::from_value(json!({ "action": "fill", "selector": "#qty", "value": 3 }))
                .unwrap();
        assert_eq!(step.value.as_deref(), Some("3"));
        assert_eq!(step.timestamp, 0);
        assert!(step.is_fill_for("#qty"));
        assert!(!step.is_fill_for("#other"));
    }
}
