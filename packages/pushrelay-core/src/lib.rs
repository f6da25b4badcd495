use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod error;
pub mod payload;
pub mod request;
pub mod resolver;

pub use error::ValidationError;
pub use payload::DeliveryPayload;
pub use request::{NotificationRequest, SoundType};
pub use resolver::{
    ChannelSource, Diagnostics, Resolver, ResolverConfig, SoundSource, resolve,
};

pub const SEND_SUCCESS_MESSAGE: &str = "Notification sent successfully";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed. Use POST.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or unregistered FCM token";
pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send notification";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// 发送成功响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message_id: String,
    pub message: String,
}

impl SendResponse {
    pub fn sent(message_id: String) -> Self {
        Self {
            success: true,
            message_id,
            message: SEND_SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, details: &str) -> Self {
        Self {
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }
}

/// 客户端收到的通知记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub tapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

impl NotificationRecord {
    pub fn received(
        title: Option<String>,
        body: Option<String>,
        data: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            body,
            data,
            timestamp: Utc::now(),
            tapped: false,
            action_id: None,
        }
    }

    pub fn tapped(
        title: Option<String>,
        body: Option<String>,
        data: BTreeMap<String, Value>,
        action_id: String,
    ) -> Self {
        Self {
            tapped: true,
            action_id: Some(action_id),
            ..Self::received(title, body, data)
        }
    }
}
