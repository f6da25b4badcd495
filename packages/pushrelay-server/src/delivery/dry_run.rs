use super::{DeliveryBackend, DeliveryError, build_message};
use async_trait::async_trait;
use pushrelay_core::DeliveryPayload;
use tracing::info;
use uuid::Uuid;

/// 仅记录日志的投递后端，用于本地开发
pub(crate) struct DryRunBackend;

#[async_trait]
impl DeliveryBackend for DryRunBackend {
    async fn send(&self, payload: &DeliveryPayload) -> Result<String, DeliveryError> {
        let message_id = format!("dry-run/{}", Uuid::new_v4());
        info!(
            message_id = %message_id,
            message = %build_message(payload),
            "dry-run delivery, nothing sent"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_dry_run_returns_synthetic_id() {
        let payload = DeliveryPayload {
            target: "device-token".to_string(),
            title: "Hello".to_string(),
            body: "World".to_string(),
            data: BTreeMap::new(),
            android_sound: None,
            android_channel_id: "default".to_string(),
            ios_sound: None,
        };

        let first = DryRunBackend.send(&payload).await.unwrap();
        let second = DryRunBackend.send(&payload).await.unwrap();

        assert!(first.starts_with("dry-run/"));
        assert_ne!(first, second);
    }
}
