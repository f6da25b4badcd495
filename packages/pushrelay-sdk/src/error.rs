use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 令牌失效或未注册，调用方应停止使用该令牌
    #[error("Invalid or unregistered FCM token: {details}")]
    TokenInvalid { details: String },

    #[error("Request rejected ({status}): {error}")]
    Rejected { status: u16, error: String },

    #[error("Failed to send notification: {details}")]
    DeliveryFailed { details: String },
}

impl SdkError {
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, SdkError::TokenInvalid { .. })
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
