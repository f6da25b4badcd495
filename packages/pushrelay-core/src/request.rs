use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 通知声音类型
///
/// 未识别的取值按 `default` 处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    Custom,
    None,
    // 未识别的取值落到最后一个变体
    #[default]
    #[serde(other)]
    Default,
}

impl SoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundType::Default => "default",
            SoundType::Custom => "custom",
            SoundType::None => "none",
        }
    }
}

impl std::fmt::Display for SoundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SoundType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "custom" => SoundType::Custom,
            "none" => SoundType::None,
            _ => SoundType::Default,
        })
    }
}

/// 推送请求
///
/// 所有字段在反序列化时都是可选的，必填项由解析器校验。空字符串视为缺失。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_type: Option<SoundType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl NotificationRequest {
    pub fn new(token: &str, title: &str, body: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_sound_type(mut self, sound_type: SoundType) -> Self {
        self.sound_type = Some(sound_type);
        self
    }

    pub fn with_sound(mut self, sound: &str) -> Self {
        self.sound = Some(sound.to_string());
        self
    }

    pub fn with_android_sound(mut self, sound: &str) -> Self {
        self.android_sound = Some(sound.to_string());
        self
    }

    pub fn with_ios_sound(mut self, sound: &str) -> Self {
        self.ios_sound = Some(sound.to_string());
        self
    }

    pub fn with_channel_id(mut self, channel_id: &str) -> Self {
        self.channel_id = Some(channel_id.to_string());
        self
    }

    /// 宽松地从任意 JSON 构建请求
    ///
    /// 非对象按空请求处理；类型不符的字段视为缺失，非对象的 `data` 被忽略，
    /// 非字符串的 `soundType` 按 `default` 处理。必填项仍由解析器校验。
    pub fn from_json_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            token: text("token"),
            title: text("title"),
            body: text("body"),
            data: fields.get("data").and_then(Value::as_object).map(|data| {
                data.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            }),
            sound_type: fields.get("soundType").map(|value| match value.as_str() {
                Some(name) => name.parse::<SoundType>().unwrap_or_default(),
                None => SoundType::Default,
            }),
            sound: text("sound"),
            android_sound: text("androidSound"),
            ios_sound: text("iosSound"),
            channel_id: text("channelId"),
        }
    }

    /// 生效的声音类型，缺省为 `default`
    pub fn effective_sound_type(&self) -> SoundType {
        self.sound_type.unwrap_or_default()
    }

    pub(crate) fn token_value(&self) -> Option<&str> {
        present(&self.token)
    }

    pub(crate) fn title_value(&self) -> Option<&str> {
        present(&self.title)
    }

    pub(crate) fn body_value(&self) -> Option<&str> {
        present(&self.body)
    }

    pub(crate) fn sound_value(&self) -> Option<&str> {
        present(&self.sound)
    }

    pub(crate) fn android_sound_value(&self) -> Option<&str> {
        present(&self.android_sound)
    }

    pub(crate) fn ios_sound_value(&self) -> Option<&str> {
        present(&self.ios_sound)
    }

    pub(crate) fn channel_id_value(&self) -> Option<&str> {
        present(&self.channel_id)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize_camel_case() {
        let request: NotificationRequest = serde_json::from_str(
            r#"{
                "token": "tok",
                "title": "Hello",
                "body": "World",
                "data": {"count": 5},
                "soundType": "custom",
                "androidSound": "chime",
                "iosSound": "bell",
                "channelId": "alerts"
            }"#,
        )
        .unwrap();

        assert_eq!(request.token.as_deref(), Some("tok"));
        assert_eq!(request.sound_type, Some(SoundType::Custom));
        assert_eq!(request.android_sound.as_deref(), Some("chime"));
        assert_eq!(request.ios_sound.as_deref(), Some("bell"));
        assert_eq!(request.channel_id.as_deref(), Some("alerts"));
        assert_eq!(request.data.unwrap()["count"], serde_json::json!(5));
    }

    #[test]
    fn test_unknown_sound_type_behaves_as_default() {
        let request: NotificationRequest =
            serde_json::from_str(r#"{"soundType": "loud"}"#).unwrap();
        assert_eq!(request.sound_type, Some(SoundType::Default));

        let request: NotificationRequest = serde_json::from_str(r#"{"soundType": ""}"#).unwrap();
        assert_eq!(request.effective_sound_type(), SoundType::Default);
    }

    #[test]
    fn test_missing_sound_type_defaults() {
        let request: NotificationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.sound_type, None);
        assert_eq!(request.effective_sound_type(), SoundType::Default);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let request = NotificationRequest::new("", "title", "")
            .with_sound("")
            .with_channel_id("");

        assert_eq!(request.token_value(), None);
        assert_eq!(request.title_value(), Some("title"));
        assert_eq!(request.body_value(), None);
        assert_eq!(request.sound_value(), None);
        assert_eq!(request.channel_id_value(), None);
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let request = NotificationRequest::new("tok", "t", "b").with_sound_type(SoundType::None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"token": "tok", "title": "t", "body": "b", "soundType": "none"})
        );
    }

    #[test]
    fn test_sound_type_names_deserialize() {
        for (name, expected) in [
            ("default", SoundType::Default),
            ("custom", SoundType::Custom),
            ("none", SoundType::None),
        ] {
            let parsed: SoundType = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_from_json_value_ignores_mistyped_fields() {
        let request = NotificationRequest::from_json_value(&serde_json::json!({
            "title": 7,
            "body": "b",
            "data": "x",
            "soundType": 5,
            "androidSound": ["chime"]
        }));

        assert_eq!(request.token, None);
        assert_eq!(request.title, None);
        assert_eq!(request.body.as_deref(), Some("b"));
        assert_eq!(request.data, None);
        assert_eq!(request.sound_type, Some(SoundType::Default));
        assert_eq!(request.android_sound, None);
    }

    #[test]
    fn test_from_json_value_keeps_well_typed_fields() {
        let request = NotificationRequest::from_json_value(&serde_json::json!({
            "token": "tok",
            "title": "t",
            "body": "b",
            "data": {"count": 5},
            "soundType": "none",
            "sound": "ding",
            "iosSound": "bell",
            "channelId": "alerts"
        }));

        let expected = NotificationRequest::new("tok", "t", "b")
            .with_data("count", 5)
            .with_sound_type(SoundType::None)
            .with_sound("ding")
            .with_ios_sound("bell")
            .with_channel_id("alerts");
        assert_eq!(request, expected);
    }

    #[test]
    fn test_from_json_value_non_object() {
        assert_eq!(
            NotificationRequest::from_json_value(&serde_json::json!([1, 2])),
            NotificationRequest::default()
        );
        assert_eq!(
            NotificationRequest::from_json_value(&Value::Null),
            NotificationRequest::default()
        );
    }

    #[test]
    fn test_sound_type_from_str() {
        assert_eq!("custom".parse::<SoundType>().unwrap(), SoundType::Custom);
        assert_eq!("none".parse::<SoundType>().unwrap(), SoundType::None);
        assert_eq!("anything".parse::<SoundType>().unwrap(), SoundType::Default);
    }
}
