pub mod display;
pub mod error;
pub mod platform;
pub mod service;

pub use display::{
    ChannelSound, ChannelSpec, DisplayPlan, PRESET_SOUNDS, RemoteMessage, RemoteNotification,
    plan_display, preset_channels, sound_resource_name,
};
pub use error::{ClientError, ClientResult, PlatformError};
pub use platform::{
    EventSink, InboundNotification, PermissionState, PlatformEvent, PushPlatform,
    UnsupportedPlatform,
};
pub use pushrelay_core::NotificationRecord;
pub use service::{PushNotificationService, RegistrationState, format_record};
