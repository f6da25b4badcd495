use crate::SdkResult;
use crate::error::*;
use pushrelay_core::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const SEND_PATH: &str = "sendPushNotification";
const HEALTH_PATH: &str = "health";

#[derive(Clone)]
pub struct PushRelayClient {
    client: Client,
    pub base_url: String,
    pub timeout: Duration,
}

impl PushRelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> SdkResult<Url> {
        Ok(Url::parse(&format!("{}/{}", self.base_url, path))?)
    }

    /// 发送一条推送通知，成功时返回中继服务的响应
    pub async fn send_notification(&self, request: &NotificationRequest) -> SdkResult<SendResponse> {
        let url = self.endpoint(SEND_PATH)?;
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status == StatusCode::OK {
            return Ok(serde_json::from_str(&text)?);
        }

        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(error) => Err(classify_error(status.as_u16(), error)),
            Err(_) => Err(SdkError::Rejected {
                status: status.as_u16(),
                error: text,
            }),
        }
    }

    /// 检查服务是否存活
    pub async fn health(&self) -> SdkResult<bool> {
        let url = self.endpoint(HEALTH_PATH)?;
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        Ok(response.status().is_success())
    }
}

fn classify_error(status: u16, response: ErrorResponse) -> SdkError {
    let details = response.details.unwrap_or_default();
    match status {
        400 if response.error == INVALID_TOKEN_MESSAGE => SdkError::TokenInvalid { details },
        500 if response.error == DELIVERY_FAILED_MESSAGE => SdkError::DeliveryFailed { details },
        _ => SdkError::Rejected {
            status,
            error: response.error,
        },
    }
}
