use axum::http::StatusCode;

use crate::utils::app_error::AppError;

#[derive(Debug)]
pub enum WikiServiceError {
    /// No response arrived within the fetch deadline.
    Timeout,
    Request(String),
    Payload(String),
}

impl std::fmt::Display for WikiServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            WikiServiceError::Timeout => write!(f, "Geosearch request timed out"),
            WikiServiceError::Request(e) => write!(f, "Request error: {}", e),
            WikiServiceError::Payload(e) => write!(f, "Payload error: {}", e),
        }
    }
}

impl From<WikiServiceError> for AppError {
    fn from(e: WikiServiceError) -> Self {
        match e {
            WikiServiceError::Timeout => {
                AppError::new(StatusCode::GATEWAY_TIMEOUT, "Geosearch request timed out")
            }
            WikiServiceError::Request(_) | WikiServiceError::Payload(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, "Failed to fetch nearby items")
            }
        }
    }
}
