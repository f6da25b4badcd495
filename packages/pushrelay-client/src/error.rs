use thiserror::Error;

/// 宿主平台调用失败
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("push notifications are not supported on this platform")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("User denied permissions!")]
    PermissionDenied,

    #[error("Registration failed: {0}")]
    Registration(PlatformError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

pub type ClientResult<T> = Result<T, ClientError>;
