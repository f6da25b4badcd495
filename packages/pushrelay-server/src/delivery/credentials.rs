use super::{DeliveryError, DeliveryErrorCode};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// 过期前提前刷新
const REFRESH_MARGIN_SECS: i64 = 60;

/// FCM 认证方式
#[derive(Clone)]
pub(crate) enum Credentials {
    /// 预先获取的 OAuth2 访问令牌
    AccessToken(String),
    /// Google 服务账号密钥
    ServiceAccount(ServiceAccountKey),
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// 服务账号密钥，私钥在加载时解析一次
#[derive(Clone)]
pub(crate) struct ServiceAccountKey {
    pub(crate) client_email: String,
    pub(crate) token_uri: String,
    pub(crate) project_id: Option<String>,
    signing_key: EncodingKey,
}

impl ServiceAccountKey {
    pub(crate) fn from_json(text: &str) -> Result<Self> {
        let file: ServiceAccountFile =
            serde_json::from_str(text).context("invalid service account key")?;
        let signing_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .context("invalid service account private key")?;
        Ok(Self {
            client_email: file.client_email,
            token_uri: file.token_uri,
            project_id: file.project_id,
            signing_key,
        })
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials file {}", path.display()))?;
        Self::from_json(&text)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// 提供 FCM 请求所需的访问令牌，服务账号令牌在过期前复用
pub(crate) struct TokenSource {
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub(crate) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub(crate) async fn access_token(&self, client: &Client) -> Result<String, DeliveryError> {
        let key = match &self.credentials {
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(key) => key,
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        debug!(client_email = %key.client_email, "exchanging service account assertion");
        let fresh = exchange(client, key).await?;
        info!(expires_at = %fresh.expires_at, "obtained FCM access token");
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

fn build_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, DeliveryError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: MESSAGING_SCOPE,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };
    encode(&Header::new(Algorithm::RS256), &claims, &key.signing_key).map_err(|err| {
        DeliveryError::new(
            DeliveryErrorCode::InvalidCredential,
            format!("failed to sign assertion: {err}"),
        )
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

async fn exchange(client: &Client, key: &ServiceAccountKey) -> Result<CachedToken, DeliveryError> {
    let now = Utc::now();
    let assertion = build_assertion(key, now)?;
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeliveryError::new(
            DeliveryErrorCode::InvalidCredential,
            format!("token exchange failed with HTTP {status}: {body}"),
        ));
    }

    let token: TokenResponse = response.json().await?;
    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
