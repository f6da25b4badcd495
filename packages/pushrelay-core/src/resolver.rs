use crate::error::ValidationError;
use crate::payload::DeliveryPayload;
use crate::request::{NotificationRequest, SoundType};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

pub const DEFAULT_SOUND: &str = "default";
pub const DEFAULT_CHANNEL_ID: &str = "default";
pub const CUSTOM_SOUND_FALLBACK: &str = "custom_sound";
pub const CUSTOM_SOUND_CHANNEL_PREFIX: &str = "custom_sound_channel";

/// Android 渠道的声音只能在创建时设置，因此每种声音使用独立的渠道。
pub fn per_sound_channel_id(sound: &str) -> String {
    format!("{CUSTOM_SOUND_CHANNEL_PREFIX}_{sound}")
}

/// 决策日志的详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Diagnostics {
    /// 每一步决策以 `debug` 级别记录
    #[default]
    Quiet,
    /// 每一步决策以 `info` 级别记录
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// `soundType = custom` 且未指定声音时 iOS 使用的声音
    pub ios_custom_sound: String,
    pub diagnostics: Diagnostics,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ios_custom_sound: CUSTOM_SOUND_FALLBACK.to_string(),
            diagnostics: Diagnostics::Quiet,
        }
    }
}

impl ResolverConfig {
    pub fn with_ios_custom_sound(mut self, sound: &str) -> Self {
        self.ios_custom_sound = sound.to_string();
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// 解析出的提示音来自哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSource {
    Silent,
    PlatformOverride,
    SharedSound,
    CustomFallback,
    SystemDefault,
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundSource::Silent => "silent (soundType: none)",
            SoundSource::PlatformOverride => "platform-specific sound parameter",
            SoundSource::SharedSound => "sound parameter",
            SoundSource::CustomFallback => "fallback for soundType: custom",
            SoundSource::SystemDefault => "system default",
        })
    }
}

/// 解析出的 Android 渠道来自哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSource {
    Explicit,
    PerSound,
    Silent,
    SystemDefault,
}

impl fmt::Display for ChannelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelSource::Explicit => "explicitly provided",
            ChannelSource::PerSound => "custom sound, one channel per sound",
            ChannelSource::Silent => "silent notification",
            ChannelSource::SystemDefault => "default channel",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, request: &NotificationRequest) -> Result<DeliveryPayload, ValidationError> {
        let target = request.token_value().ok_or(ValidationError::MissingToken)?;
        let (title, body) = match (request.title_value(), request.body_value()) {
            (Some(title), Some(body)) => (title, body),
            _ => return Err(ValidationError::MissingContent),
        };

        let sound_type = request.effective_sound_type();
        self.note("sound type", Some(sound_type.as_str()), &"request");

        let (android_sound, source) = android_sound(request, sound_type);
        self.note("android sound", android_sound.as_deref(), &source);

        let (android_channel_id, source) =
            android_channel(request, sound_type, android_sound.as_deref());
        self.note("android channel", Some(&android_channel_id), &source);

        let (ios_sound, source) = self.ios_sound(request, sound_type);
        self.note("ios sound", ios_sound.as_deref(), &source);

        let data = augment_data(request.data.as_ref(), android_sound.as_deref());

        Ok(DeliveryPayload {
            target: target.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
            android_sound,
            android_channel_id,
            ios_sound,
        })
    }

    fn ios_sound(
        &self,
        request: &NotificationRequest,
        sound_type: SoundType,
    ) -> (Option<String>, SoundSource) {
        if sound_type == SoundType::None {
            return (None, SoundSource::Silent);
        }
        if let Some(sound) = request.ios_sound_value() {
            return (Some(sound.to_string()), SoundSource::PlatformOverride);
        }
        if let Some(sound) = request.sound_value() {
            return (Some(sound.to_string()), SoundSource::SharedSound);
        }
        if sound_type == SoundType::Custom {
            return (
                Some(self.config.ios_custom_sound.clone()),
                SoundSource::CustomFallback,
            );
        }
        (Some(DEFAULT_SOUND.to_string()), SoundSource::SystemDefault)
    }

    fn note(&self, step: &'static str, value: Option<&str>, reason: &dyn fmt::Display) {
        let value = value.unwrap_or("not set");
        match self.config.diagnostics {
            Diagnostics::Verbose => info!(step, value, reason = %reason, "resolved"),
            Diagnostics::Quiet => debug!(step, value, reason = %reason, "resolved"),
        }
    }
}

/// 使用 [`ResolverConfig::default`] 解析
pub fn resolve(request: &NotificationRequest) -> Result<DeliveryPayload, ValidationError> {
    Resolver::default().resolve(request)
}

fn android_sound(
    request: &NotificationRequest,
    sound_type: SoundType,
) -> (Option<String>, SoundSource) {
    if sound_type == SoundType::None {
        return (None, SoundSource::Silent);
    }
    if let Some(sound) = request.android_sound_value() {
        return (Some(sound.to_string()), SoundSource::PlatformOverride);
    }
    if let Some(sound) = request.sound_value() {
        return (Some(sound.to_string()), SoundSource::SharedSound);
    }
    if sound_type == SoundType::Custom {
        return (
            Some(CUSTOM_SOUND_FALLBACK.to_string()),
            SoundSource::CustomFallback,
        );
    }
    (Some(DEFAULT_SOUND.to_string()), SoundSource::SystemDefault)
}

fn android_channel(
    request: &NotificationRequest,
    sound_type: SoundType,
    android_sound: Option<&str>,
) -> (String, ChannelSource) {
    if let Some(channel_id) = request.channel_id_value() {
        return (channel_id.to_string(), ChannelSource::Explicit);
    }
    let custom_sound = custom_sound(android_sound);
    if sound_type == SoundType::Custom || custom_sound.is_some() {
        // soundType = custom 时 Android 总会得到一个提示音
        let sound = android_sound.unwrap_or(CUSTOM_SOUND_FALLBACK);
        return (per_sound_channel_id(sound), ChannelSource::PerSound);
    }
    if sound_type == SoundType::None {
        return (DEFAULT_CHANNEL_ID.to_string(), ChannelSource::Silent);
    }
    (DEFAULT_CHANNEL_ID.to_string(), ChannelSource::SystemDefault)
}

fn custom_sound(android_sound: Option<&str>) -> Option<&str> {
    android_sound.filter(|sound| *sound != DEFAULT_SOUND)
}

/// 调用方数据转成字符串，自定义 Android 提示音同时写入数据，应用代码读不到系统层的 sound 字段
fn augment_data(
    data: Option<&BTreeMap<String, Value>>,
    android_sound: Option<&str>,
) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = data
        .into_iter()
        .flatten()
        .map(|(key, value)| (key.clone(), coerce_to_string(value)))
        .collect();

    if let Some(sound) = custom_sound(android_sound) {
        out.insert("sound".to_string(), sound.to_string());
        out.insert("androidSound".to_string(), sound.to_string());
    }
    out
}

/// 字符串原样保留，其他值使用紧凑的 JSON 文本
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
