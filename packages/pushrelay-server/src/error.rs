use crate::delivery::DeliveryError;
use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use pushrelay_core::{
    DELIVERY_FAILED_MESSAGE, ErrorResponse, INVALID_BODY_MESSAGE, INVALID_TOKEN_MESSAGE,
    METHOD_NOT_ALLOWED_MESSAGE, ValidationError,
};
use std::fmt;
use tracing::{error, warn};

#[derive(Debug)]
pub(crate) enum AppError {
    MethodNotAllowed(Method),
    InvalidBody(serde_json::Error),
    Validation(ValidationError),
    Delivery(DeliveryError),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidBody(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        Self::Delivery(err)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MethodNotAllowed(method) => write!(f, "Method not allowed: {}", method),
            AppError::InvalidBody(err) => write!(f, "Invalid request body: {}", err),
            AppError::Validation(err) => write!(f, "Validation error: {}", err),
            AppError::Delivery(err) => write!(f, "Delivery error: {}", err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::MethodNotAllowed(method) => {
                warn!(%method, "method not allowed");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    ErrorResponse::new(METHOD_NOT_ALLOWED_MESSAGE),
                )
            }
            AppError::InvalidBody(err) => {
                warn!(error = %err, "invalid request body");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(INVALID_BODY_MESSAGE, &err.to_string()),
                )
            }
            AppError::Validation(err) => {
                warn!(error = %err, "rejected notification request");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(&err.to_string()))
            }
            AppError::Delivery(err) if err.is_token_invalid() => {
                warn!(code = %err.code, error = %err.message, "delivery token rejected");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(INVALID_TOKEN_MESSAGE, &err.message),
                )
            }
            AppError::Delivery(err) => {
                error!(code = %err.code, error = %err.message, "error sending notification");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details(DELIVERY_FAILED_MESSAGE, &err.message),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
