pub mod client;
pub mod error;

pub use client::PushRelayClient;
pub use error::{SdkError, SdkResult};
pub use pushrelay_core::{
    DELIVERY_FAILED_MESSAGE, ErrorResponse, INVALID_TOKEN_MESSAGE, NotificationRequest,
    SendResponse, SoundType,
};
