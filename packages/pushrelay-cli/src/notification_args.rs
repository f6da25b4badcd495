use anyhow::{Result, bail};
use clap::Args;
use pushrelay_core::{NotificationRequest, SoundType};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Args, Debug, Clone)]
pub struct NotificationArgs {
    /// Target device token
    #[arg(long)]
    pub token: String,
    /// Notification title
    #[arg(long)]
    pub title: String,
    /// Notification body
    #[arg(long)]
    pub body: String,
    /// Sound selection mode
    #[arg(long, value_parser = ["default", "custom", "none"])]
    pub sound_type: Option<String>,
    /// Sound for both platforms
    #[arg(long)]
    pub sound: Option<String>,
    /// Android sound, overrides --sound
    #[arg(long)]
    pub android_sound: Option<String>,
    /// iOS sound, overrides --sound
    #[arg(long)]
    pub ios_sound: Option<String>,
    /// Android notification channel
    #[arg(long)]
    pub channel_id: Option<String>,
    /// Custom data entry as key=value, repeatable
    #[arg(long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,
}

impl NotificationArgs {
    pub fn to_request(&self) -> Result<NotificationRequest> {
        let mut request = NotificationRequest::new(&self.token, &self.title, &self.body);
        if let Some(sound_type) = &self.sound_type {
            request = request.with_sound_type(sound_type.parse::<SoundType>().unwrap_or_default());
        }
        if let Some(sound) = &self.sound {
            request = request.with_sound(sound);
        }
        if let Some(sound) = &self.android_sound {
            request = request.with_android_sound(sound);
        }
        if let Some(sound) = &self.ios_sound {
            request = request.with_ios_sound(sound);
        }
        if let Some(channel_id) = &self.channel_id {
            request = request.with_channel_id(channel_id);
        }
        if !self.data.is_empty() {
            request.data = Some(parse_data(&self.data)?);
        }
        Ok(request)
    }
}

/// 解析 `key=value`，值能按 JSON 解析时保留其类型，否则当作字符串
fn parse_data(entries: &[String]) -> Result<BTreeMap<String, Value>> {
    let mut data = BTreeMap::new();
    for entry in entries {
        let Some((key, raw)) = entry.split_once('=') else {
            bail!("invalid data entry '{entry}', expected KEY=VALUE");
        };
        if key.is_empty() {
            bail!("invalid data entry '{entry}', key is empty");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        data.insert(key.to_string(), value);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> NotificationArgs {
        NotificationArgs {
            token: "tok".to_string(),
            title: "Hello".to_string(),
            body: "World".to_string(),
            sound_type: None,
            sound: None,
            android_sound: None,
            ios_sound: None,
            channel_id: None,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_minimal_request() {
        let request = args().to_request().unwrap();
        assert_eq!(request, NotificationRequest::new("tok", "Hello", "World"));
    }

    #[test]
    fn test_sound_fields() {
        let mut args = args();
        args.sound_type = Some("custom".to_string());
        args.sound = Some("ding".to_string());
        args.ios_sound = Some("bell.caf".to_string());
        args.channel_id = Some("alerts".to_string());

        let request = args.to_request().unwrap();
        assert_eq!(request.sound_type, Some(SoundType::Custom));
        assert_eq!(request.sound.as_deref(), Some("ding"));
        assert_eq!(request.ios_sound.as_deref(), Some("bell.caf"));
        assert_eq!(request.android_sound, None);
        assert_eq!(request.channel_id.as_deref(), Some("alerts"));
    }

    #[test]
    fn test_data_values_keep_json_types() {
        let data = parse_data(&[
            "count=5".to_string(),
            "flag=true".to_string(),
            "name=alice".to_string(),
            "nested={\"a\":1}".to_string(),
            "expr=a=b".to_string(),
        ])
        .unwrap();

        assert_eq!(data["count"], json!(5));
        assert_eq!(data["flag"], json!(true));
        assert_eq!(data["name"], json!("alice"));
        assert_eq!(data["nested"], json!({ "a": 1 }));
        assert_eq!(data["expr"], json!("a=b"));
    }

    #[test]
    fn test_invalid_data_entries() {
        assert!(parse_data(&["novalue".to_string()]).is_err());
        assert!(parse_data(&["=x".to_string()]).is_err());
    }
}
