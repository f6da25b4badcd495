use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 投递载荷
///
/// 由 [`NotificationRequest`](crate::NotificationRequest) 确定性地推导而来。
/// 声音为 `None` 表示该平台静音投递；Android 渠道始终存在。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload {
    pub target: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_sound: Option<String>,
    pub android_channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_sound: Option<String>,
}

impl DeliveryPayload {
    pub fn is_silent_on_android(&self) -> bool {
        self.android_sound.is_none()
    }

    pub fn is_silent_on_ios(&self) -> bool {
        self.ios_sound.is_none()
    }
}
