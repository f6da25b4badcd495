use crate::error::AppError;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use pushrelay_core::{NotificationRequest, SendResponse};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const NOT_SPECIFIED: &str = "not specified";

pub(crate) async fn send_push_notification_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Response, AppError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed(method));
    }

    let request = parse_request(&body)?;
    log_request(&request);

    let payload = state.resolver.resolve(&request)?;
    debug!(
        android_sound = payload.android_sound.as_deref().unwrap_or("not set"),
        android_channel = %payload.android_channel_id,
        ios_sound = payload.ios_sound.as_deref().unwrap_or("not set"),
        data_sound = payload.data.get("sound").map(String::as_str).unwrap_or("not set"),
        "delivery payload"
    );

    let message_id = state.delivery.send(&payload).await?;
    info!(%message_id, "notification sent");

    Ok((StatusCode::OK, Json(SendResponse::sent(message_id))).into_response())
}

/// 只有无法解析的 JSON 才会被拒绝；空请求体、非对象或字段类型不符都交由校验处理，
/// 保证缺少令牌时总是返回令牌错误
fn parse_request(body: &[u8]) -> Result<NotificationRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NotificationRequest::default());
    }
    let value: Value = serde_json::from_slice(body)?;
    Ok(NotificationRequest::from_json_value(&value))
}

fn log_request(request: &NotificationRequest) {
    info!(
        sound_type = request
            .sound_type
            .map(|t| t.as_str())
            .unwrap_or("default (not specified)"),
        sound = request.sound.as_deref().unwrap_or(NOT_SPECIFIED),
        android_sound = request.android_sound.as_deref().unwrap_or(NOT_SPECIFIED),
        ios_sound = request.ios_sound.as_deref().unwrap_or(NOT_SPECIFIED),
        channel_id = request.channel_id.as_deref().unwrap_or(NOT_SPECIFIED),
        data_keys = request.data.as_ref().map_or(0, |d| d.len()),
        "push notification request"
    );
}
