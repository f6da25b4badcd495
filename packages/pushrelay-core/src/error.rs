use thiserror::Error;

/// 请求校验错误，消息文本即 HTTP 响应中的 `error` 字段
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("FCM token is required")]
    MissingToken,

    #[error("Title and body are required")]
    MissingContent,
}
