use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures raised by the in-process DOM (the equivalent of a thrown DOMException)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("'{0}' is not a valid selector")]
    InvalidSelector(String),

    #[error("Element is not a form field: {0}")]
    NotAFormField(String),

    #[error("Node is not an element")]
    NotAnElement,
}

/// Failures of the form actuator, surfaced as `{ ok: false, error }`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Option not found: {0}")]
    OptionNotFound(String),

    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Failed to fetch page: {0}")]
    FetchError(String),

    #[error(transparent)]
    Actuation(#[from] ActuationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::PageNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::FetchError(_) => (StatusCode::BAD_GATEWAY, "Fetch Error"),
            AppError::Actuation(ActuationError::Dom(DomError::InvalidSelector(_))) => {
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
            AppError::Actuation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Actuation Error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuation_messages() {
        assert_eq!(
            ActuationError::ElementNotFound("#missing".to_string()).to_string(),
            "Element not found: #missing"
        );
        assert_eq!(
            ActuationError::from(DomError::InvalidSelector("#".to_string())).to_string(),
            "'#' is not a valid selector"
        );
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::PageNotFound("abc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            AppError::Actuation(ActuationError::FormNotFound("form".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
