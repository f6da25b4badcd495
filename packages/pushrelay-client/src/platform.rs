use crate::error::PlatformError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// 通知权限状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// 尚未决定，部分平台需要再请求一次
    Prompt,
}

/// 平台送达的一条通知
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    TokenIssued(String),
    RegistrationFailed(String),
    NotificationReceived(InboundNotification),
    NotificationTapped {
        action_id: String,
        notification: InboundNotification,
    },
}

/// 宿主通过它把平台事件交给客户端
pub type EventSink = mpsc::UnboundedSender<PlatformEvent>;

/// 宿主平台的推送与权限接口
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// 是否运行在支持推送的原生环境中
    fn is_native(&self) -> bool;

    async fn request_permissions(&self) -> Result<PermissionState, PlatformError>;

    /// 向推送服务注册，之后的令牌和通知都通过 `events` 送达
    async fn register(&self, events: EventSink) -> Result<(), PlatformError>;
}

/// 非原生环境，例如桌面或浏览器
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

#[async_trait]
impl PushPlatform for UnsupportedPlatform {
    fn is_native(&self) -> bool {
        false
    }

    async fn request_permissions(&self) -> Result<PermissionState, PlatformError> {
        Ok(PermissionState::Denied)
    }

    async fn register(&self, _events: EventSink) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}
