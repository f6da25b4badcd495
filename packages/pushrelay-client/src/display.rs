use crate::platform::InboundNotification;
use pushrelay_core::resolver::{
    CUSTOM_SOUND_CHANNEL_PREFIX, DEFAULT_CHANNEL_ID, DEFAULT_SOUND, coerce_to_string,
    per_sound_channel_id,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 应用内置、启动时预建渠道的提示音
pub const PRESET_SOUNDS: [&str; 3] = ["ding", "custom_sound", "shockding"];

const CUSTOM_CHANNEL_NAME: &str = "Custom Sound Notifications";
const CUSTOM_CHANNEL_DESCRIPTION: &str = "Notifications with custom sound";
const DEFAULT_CHANNEL_NAME: &str = "Default Notifications";
const DEFAULT_CHANNEL_DESCRIPTION: &str = "Notifications with default system sound";

/// 原生层收到的一条 FCM 消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteMessage {
    pub data: BTreeMap<String, String>,
    pub notification: Option<RemoteNotification>,
}

/// FCM 消息里的通知部分
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub sound: Option<String>,
    pub channel_id: Option<String>,
}

impl From<&InboundNotification> for RemoteMessage {
    fn from(notification: &InboundNotification) -> Self {
        Self {
            data: notification
                .data
                .iter()
                .map(|(key, value)| (key.clone(), coerce_to_string(value)))
                .collect(),
            notification: Some(RemoteNotification {
                title: notification.title.clone(),
                body: notification.body.clone(),
                ..Default::default()
            }),
        }
    }
}

impl RemoteMessage {
    fn data_value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn notification_value(&self, field: fn(&RemoteNotification) -> &Option<String>) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(|n| field(n).as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// 设备端如何展示一条通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPlan {
    pub title: String,
    pub body: String,
    pub channel_id: String,
    /// 消息里的原始提示音名，`None` 表示使用系统默认
    pub sound: Option<String>,
}

impl DisplayPlan {
    /// 提示音对应的资源名，已去掉扩展名
    pub fn sound_resource(&self) -> Option<&str> {
        self.sound.as_deref().and_then(sound_resource_name)
    }

    /// 已有渠道的提示音与本次要求一致时可以直接复用，渠道创建后不可修改
    pub fn reuses_channel(&self, existing_sound: Option<&str>) -> bool {
        existing_sound == self.sound_resource()
    }
}

/// 决定收到的消息如何展示；缺少标题或正文时不展示
///
/// 数据载荷优先于通知载荷，提示音依次取 `androidSound`、`sound`、通知自带的提示音。
/// 渠道取显式的 `channelId`，否则非默认提示音落到 `custom_sound_channel_<sound>`，
/// 其余情况用 `default`。
pub fn plan_display(message: &RemoteMessage) -> Option<DisplayPlan> {
    let title = message
        .data_value("title")
        .or_else(|| message.notification_value(|n| &n.title));
    let body = message
        .data_value("body")
        .or_else(|| message.notification_value(|n| &n.body));
    let (Some(title), Some(body)) = (title, body) else {
        warn!("missing title or body, skipping notification");
        return None;
    };

    let sound = message
        .data_value("androidSound")
        .or_else(|| message.data_value("sound"))
        .or_else(|| message.notification_value(|n| &n.sound));
    let channel_id = message
        .data_value("channelId")
        .or_else(|| message.notification_value(|n| &n.channel_id));

    let channel_id = match (channel_id, sound) {
        (Some(channel_id), _) => channel_id.to_string(),
        (None, Some(sound)) if sound != DEFAULT_SOUND => per_sound_channel_id(sound),
        (None, _) => DEFAULT_CHANNEL_ID.to_string(),
    };
    debug!(%channel_id, sound = ?sound, "planned notification display");

    Some(DisplayPlan {
        title: title.to_string(),
        body: body.to_string(),
        channel_id,
        sound: sound.map(str::to_string),
    })
}

/// 提示音名到 `res/raw` 资源名，去掉最后一个扩展名；`default` 和空串没有资源
pub fn sound_resource_name(sound: &str) -> Option<&str> {
    if sound.is_empty() || sound == DEFAULT_SOUND {
        return None;
    }
    Some(sound.rsplit_once('.').map_or(sound, |(stem, _)| stem))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSound {
    SystemDefault,
    /// `res/raw` 中的资源名
    Resource(String),
}

/// 需要在应用启动时创建的通知渠道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sound: ChannelSound,
}

/// 启动时预建的渠道：每个可用提示音一个，再加上兜底渠道和默认渠道
///
/// 应用被关闭时系统只能使用已缓存的渠道提示音，所以要提前建好。
/// `has_resource` 判断提示音文件是否存在，缺失的提示音跳过。
pub fn preset_channels(sounds: &[&str], has_resource: impl Fn(&str) -> bool) -> Vec<ChannelSpec> {
    let mut channels = Vec::with_capacity(sounds.len() + 2);
    for sound in sounds {
        let Some(resource) = sound_resource_name(sound).filter(|r| has_resource(r)) else {
            warn!(sound, "sound file not found");
            continue;
        };
        channels.push(ChannelSpec {
            id: per_sound_channel_id(sound),
            name: format!("{CUSTOM_CHANNEL_NAME} - {sound}"),
            description: format!("{CUSTOM_CHANNEL_DESCRIPTION} ({sound})"),
            sound: ChannelSound::Resource(resource.to_string()),
        });
    }
    channels.push(ChannelSpec {
        id: CUSTOM_SOUND_CHANNEL_PREFIX.to_string(),
        name: CUSTOM_CHANNEL_NAME.to_string(),
        description: CUSTOM_CHANNEL_DESCRIPTION.to_string(),
        sound: ChannelSound::SystemDefault,
    });
    channels.push(ChannelSpec {
        id: DEFAULT_CHANNEL_ID.to_string(),
        name: DEFAULT_CHANNEL_NAME.to_string(),
        description: DEFAULT_CHANNEL_DESCRIPTION.to_string(),
        sound: ChannelSound::SystemDefault,
    });
    channels
}
