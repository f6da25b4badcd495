use crate::bootstrap::config::{DeliveryConfig, DeliveryMode};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use pushrelay_core::DeliveryPayload;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

mod credentials;
mod dry_run;
mod fcm;

pub(crate) use credentials::{Credentials, ServiceAccountKey, TokenSource};
pub(crate) use dry_run::DryRunBackend;
pub(crate) use fcm::{DEFAULT_FCM_ENDPOINT, FcmBackend, FcmConfig, build_message};

/// 推送投递后端
#[async_trait]
pub(crate) trait DeliveryBackend: Send + Sync {
    /// 投递一条消息，返回后端分配的消息 ID
    async fn send(&self, payload: &DeliveryPayload) -> Result<String, DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryErrorCode {
    InvalidRegistrationToken,
    RegistrationTokenNotRegistered,
    InvalidArgument,
    MismatchedCredential,
    MessageRateExceeded,
    ServerUnavailable,
    InternalError,
    ThirdPartyAuthError,
    InvalidCredential,
    NetworkError,
    UnknownError,
}

impl DeliveryErrorCode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRegistrationToken => "messaging/invalid-registration-token",
            Self::RegistrationTokenNotRegistered => "messaging/registration-token-not-registered",
            Self::InvalidArgument => "messaging/invalid-argument",
            Self::MismatchedCredential => "messaging/mismatched-credential",
            Self::MessageRateExceeded => "messaging/message-rate-exceeded",
            Self::ServerUnavailable => "messaging/server-unavailable",
            Self::InternalError => "messaging/internal-error",
            Self::ThirdPartyAuthError => "messaging/third-party-auth-error",
            Self::InvalidCredential => "app/invalid-credential",
            Self::NetworkError => "app/network-error",
            Self::UnknownError => "messaging/unknown-error",
        }
    }

    /// 令牌失效或未注册，调用方可以据此清理令牌
    pub(crate) fn is_token_invalid(&self) -> bool {
        matches!(
            self,
            Self::InvalidRegistrationToken | Self::RegistrationTokenNotRegistered
        )
    }
}

impl fmt::Display for DeliveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub(crate) struct DeliveryError {
    pub(crate) code: DeliveryErrorCode,
    pub(crate) message: String,
}

impl DeliveryError {
    pub(crate) fn new(code: DeliveryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn is_token_invalid(&self) -> bool {
        self.code.is_token_invalid()
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(DeliveryErrorCode::NetworkError, err.to_string())
    }
}

/// 启动时构建一次投递后端，配置不完整时立即失败
pub(crate) fn init(config: &DeliveryConfig) -> Result<Arc<dyn DeliveryBackend>> {
    match config.mode {
        DeliveryMode::DryRun => {
            info!("delivery backend: dry-run");
            Ok(Arc::new(DryRunBackend))
        }
        DeliveryMode::Fcm => {
            let credentials = load_credentials(config)?;
            let project_id = match (&config.project_id, &credentials) {
                (Some(project_id), _) => project_id.clone(),
                (None, Credentials::ServiceAccount(key)) => match &key.project_id {
                    Some(project_id) => project_id.clone(),
                    None => bail!("PUSHRELAY_FCM_PROJECT_ID is required"),
                },
                (None, Credentials::AccessToken(_)) => {
                    bail!("PUSHRELAY_FCM_PROJECT_ID is required")
                }
            };
            let fcm_config = FcmConfig {
                project_id,
                endpoint: config.endpoint.clone(),
                validate_only: config.validate_only,
                request_timeout: config.request_timeout,
            };
            info!(
                project_id = %fcm_config.project_id,
                endpoint = %fcm_config.endpoint,
                validate_only = fcm_config.validate_only,
                "delivery backend: fcm"
            );
            let backend = FcmBackend::new(fcm_config, TokenSource::new(credentials))
                .context("failed to build FCM http client")?;
            Ok(Arc::new(backend))
        }
    }
}

fn load_credentials(config: &DeliveryConfig) -> Result<Credentials> {
    if let Some(path) = &config.credentials_path {
        let key = ServiceAccountKey::from_file(path)?;
        return Ok(Credentials::ServiceAccount(key));
    }
    if let Some(token) = &config.access_token {
        return Ok(Credentials::AccessToken(token.clone()));
    }
    bail!("FCM delivery needs PUSHRELAY_FCM_CREDENTIALS or PUSHRELAY_FCM_ACCESS_TOKEN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fcm_config() -> DeliveryConfig {
        DeliveryConfig {
            mode: DeliveryMode::Fcm,
            project_id: Some("demo-project".to_string()),
            access_token: Some("ya29.token".to_string()),
            credentials_path: None,
            endpoint: DEFAULT_FCM_ENDPOINT.to_string(),
            validate_only: false,
            request_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_token_invalid_codes() {
        assert!(DeliveryErrorCode::InvalidRegistrationToken.is_token_invalid());
        assert!(DeliveryErrorCode::RegistrationTokenNotRegistered.is_token_invalid());
        assert!(!DeliveryErrorCode::InvalidArgument.is_token_invalid());
        assert!(!DeliveryErrorCode::InternalError.is_token_invalid());
    }

    #[test]
    fn test_delivery_error_display() {
        let error = DeliveryError::new(
            DeliveryErrorCode::RegistrationTokenNotRegistered,
            "Requested entity was not found.",
        );
        assert_eq!(
            error.to_string(),
            "messaging/registration-token-not-registered: Requested entity was not found."
        );
    }

    #[test]
    fn test_init_dry_run() {
        let mut config = fcm_config();
        config.mode = DeliveryMode::DryRun;
        config.access_token = None;
        config.project_id = None;

        assert!(init(&config).is_ok());
    }

    #[test]
    fn test_init_fcm_with_access_token() {
        assert!(init(&fcm_config()).is_ok());
    }

    #[test]
    fn test_init_fcm_requires_credentials() {
        let mut config = fcm_config();
        config.access_token = None;

        let err = init(&config).err().unwrap();
        assert!(err.to_string().contains("PUSHRELAY_FCM_ACCESS_TOKEN"));
    }

    #[test]
    fn test_init_fcm_requires_project_id() {
        let mut config = fcm_config();
        config.project_id = None;

        let err = init(&config).err().unwrap();
        assert!(err.to_string().contains("PUSHRELAY_FCM_PROJECT_ID"));
    }

    #[test]
    fn test_init_fcm_fails_fast_on_missing_credentials_file() {
        let mut config = fcm_config();
        config.credentials_path = Some("/nonexistent/service-account.json".into());

        assert!(init(&config).is_err());
    }

    #[test]
    fn test_init_fcm_rejects_bad_private_key() {
        let path = std::env::temp_dir().join(format!(
            "pushrelay-bad-key-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            r#"{"client_email":"a@b.c","private_key":"garbage","project_id":"p"}"#,
        )
        .unwrap();

        let mut config = fcm_config();
        config.credentials_path = Some(path.clone());
        let result = init(&config);
        std::fs::remove_file(&path).unwrap();

        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("private key"));
    }

    #[test]
    fn test_init_fcm_with_service_account_file() {
        let path = std::env::temp_dir().join(format!(
            "pushrelay-key-{}.json",
            uuid::Uuid::new_v4()
        ));
        let key = serde_json::json!({
            "client_email": "pusher@demo.iam.gserviceaccount.com",
            "private_key": include_str!("../../testdata/service_account_key.pem"),
            "project_id": "from-file",
        });
        std::fs::write(&path, key.to_string()).unwrap();

        let mut config = fcm_config();
        config.access_token = None;
        config.project_id = None;
        config.credentials_path = Some(path.clone());
        let result = init(&config);
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_ok());
    }
}
