use super::{DeliveryBackend, DeliveryError, DeliveryErrorCode, TokenSource};
use async_trait::async_trait;
use pushrelay_core::DeliveryPayload;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

pub(crate) const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone)]
pub(crate) struct FcmConfig {
    pub(crate) project_id: String,
    pub(crate) endpoint: String,
    pub(crate) validate_only: bool,
    pub(crate) request_timeout: Duration,
}

impl FcmConfig {
    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// FCM HTTP v1 投递后端
pub(crate) struct FcmBackend {
    client: Client,
    config: FcmConfig,
    tokens: TokenSource,
}

impl FcmBackend {
    pub(crate) fn new(config: FcmConfig, tokens: TokenSource) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config,
            tokens,
        })
    }
}

#[async_trait]
impl DeliveryBackend for FcmBackend {
    async fn send(&self, payload: &DeliveryPayload) -> Result<String, DeliveryError> {
        let access_token = self.tokens.access_token(&self.client).await?;

        let mut body = json!({ "message": build_message(payload) });
        if self.config.validate_only {
            body["validate_only"] = json!(true);
        }
        debug!(message = %body, "sending FCM message");

        let response = self
            .client
            .post(self.config.send_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text));
        }

        let sent: SendResult = serde_json::from_str(&text).map_err(|err| {
            DeliveryError::new(
                DeliveryErrorCode::UnknownError,
                format!("unexpected FCM response: {err}"),
            )
        })?;
        info!(message_id = %sent.name, "FCM accepted message");
        Ok(sent.name)
    }
}

#[derive(Debug, Deserialize)]
struct SendResult {
    name: String,
}

/// 把投递载荷映射为 FCM v1 的 `Message` 资源，静音的平台不带 `sound` 字段
pub(crate) fn build_message(payload: &DeliveryPayload) -> Value {
    let mut android_notification = json!({ "channel_id": payload.android_channel_id });
    if let Some(sound) = &payload.android_sound {
        android_notification["sound"] = json!(sound);
    }

    let mut aps = json!({});
    if let Some(sound) = &payload.ios_sound {
        aps["sound"] = json!(sound);
    }

    json!({
        "token": payload.target,
        "notification": {
            "title": payload.title,
            "body": payload.body,
        },
        "data": payload.data,
        "android": {
            "priority": "high",
            "notification": android_notification,
        },
        "apns": {
            "payload": { "aps": aps },
        },
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

pub(crate) fn classify_error(status: u16, body: &str) -> DeliveryError {
    let envelope = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            let code = match status {
                401 | 403 => DeliveryErrorCode::InvalidCredential,
                429 => DeliveryErrorCode::MessageRateExceeded,
                503 => DeliveryErrorCode::ServerUnavailable,
                500..=599 => DeliveryErrorCode::InternalError,
                _ => DeliveryErrorCode::UnknownError,
            };
            return DeliveryError::new(code, format!("FCM returned HTTP {status}: {body}"));
        }
    };

    let error = envelope.error;
    let fcm_code = error.details.iter().find_map(|d| d.error_code.as_deref());
    let code = match fcm_code.or(error.status.as_deref()) {
        Some("UNREGISTERED") | Some("NOT_FOUND") => DeliveryErrorCode::RegistrationTokenNotRegistered,
        Some("INVALID_ARGUMENT") if mentions_registration_token(&error.message) => {
            DeliveryErrorCode::InvalidRegistrationToken
        }
        Some("INVALID_ARGUMENT") => DeliveryErrorCode::InvalidArgument,
        Some("SENDER_ID_MISMATCH") | Some("PERMISSION_DENIED") => {
            DeliveryErrorCode::MismatchedCredential
        }
        Some("QUOTA_EXCEEDED") | Some("RESOURCE_EXHAUSTED") => {
            DeliveryErrorCode::MessageRateExceeded
        }
        Some("UNAVAILABLE") => DeliveryErrorCode::ServerUnavailable,
        Some("INTERNAL") => DeliveryErrorCode::InternalError,
        Some("THIRD_PARTY_AUTH_ERROR") | Some("APNS_AUTH_ERROR") => {
            DeliveryErrorCode::ThirdPartyAuthError
        }
        Some("UNAUTHENTICATED") => DeliveryErrorCode::InvalidCredential,
        _ => DeliveryErrorCode::UnknownError,
    };
    DeliveryError::new(code, error.message)
}

fn mentions_registration_token(message: &str) -> bool {
    message.to_ascii_lowercase().contains("registration token")
}
