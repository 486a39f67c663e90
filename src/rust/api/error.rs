use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::classifier::ClassifierError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    InvalidBody(String),

    MissingField(&'static str),

    Classification(ClassifierError),

    Store(StoreError),

    InternalError(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidBody(msg) => write!(f, "Invalid request body: {}", msg),
            ApiError::MissingField(field) => write!(f, "Missing '{}' field in request body", field),
            ApiError::Classification(err) => write!(f, "{}", err),
            ApiError::Store(err) => write!(f, "{}", err),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Every failure surfaces as a server error with a short message
        let message = match &self {
            ApiError::InvalidBody(_) | ApiError::MissingField(_) => {
                log::warn!("Rejected request: {}", self);
                self.to_string()
            }
            ApiError::Classification(err) => {
                log::error!("Classification failed: {}", err);
                match err {
                    ClassifierError::ValidationError(msg) => msg.clone(),
                    _ => "Classification failed".to_string(),
                }
            }
            ApiError::Store(err) => {
                log::error!("Store error: {}", err);
                "A database error occurred".to_string()
            }
            ApiError::InternalError(msg) => {
                log::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::Classification(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
