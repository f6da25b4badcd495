use crate::error::{ClientError, ClientResult, PlatformError};
use crate::platform::{InboundNotification, PermissionState, PlatformEvent, PushPlatform};
use pushrelay_core::NotificationRecord;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// 令牌生命周期
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    RequestingPermission,
    /// 用户拒绝授权，之后不再重试
    Denied,
    Registering,
    Registered(String),
}

struct History {
    records: VecDeque<NotificationRecord>,
    limit: Option<usize>,
}

impl History {
    fn prepend(&mut self, record: NotificationRecord) {
        self.records.push_front(record);
        self.truncate();
    }

    fn truncate(&mut self) {
        if let Some(limit) = self.limit {
            self.records.truncate(limit);
        }
    }
}

struct Inner {
    platform: Arc<dyn PushPlatform>,
    state: Mutex<RegistrationState>,
    history: Mutex<History>,
    token: watch::Sender<Option<String>>,
}

/// 设备端推送服务：申请权限、注册令牌、记录收到的通知
#[derive(Clone)]
pub struct PushNotificationService {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PushNotificationService {
    pub fn new(platform: Arc<dyn PushPlatform>) -> Self {
        let (token, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                platform,
                state: Mutex::new(RegistrationState::Unregistered),
                history: Mutex::new(History {
                    records: VecDeque::new(),
                    limit: None,
                }),
                token,
            }),
        }
    }

    /// 限制历史记录条数，超出时丢弃最旧的记录
    pub fn with_history_limit(self, limit: usize) -> Self {
        {
            let mut history = lock(&self.inner.history);
            history.limit = Some(limit);
            history.truncate();
        }
        self
    }

    pub async fn initialize_push_notifications(&self) -> ClientResult<()> {
        if !self.inner.platform.is_native() {
            info!("push notifications are only available on native platforms");
            return Ok(());
        }

        {
            let mut state = lock(&self.inner.state);
            match *state {
                RegistrationState::Unregistered => *state = RegistrationState::RequestingPermission,
                RegistrationState::Denied => return Err(ClientError::PermissionDenied),
                ref current => {
                    debug!(state = ?current, "push notifications already initialized");
                    return Ok(());
                }
            }
        }

        let permission = match self.acquire_permission().await {
            Ok(permission) => permission,
            Err(err) => {
                self.set_state(RegistrationState::Unregistered);
                return Err(err.into());
            }
        };
        if permission != PermissionState::Granted {
            self.set_state(RegistrationState::Denied);
            return Err(ClientError::PermissionDenied);
        }

        self.set_state(RegistrationState::Registering);
        let (events, receiver) = mpsc::unbounded_channel();
        tokio::spawn(listen(self.clone(), receiver));

        if let Err(err) = self.inner.platform.register(events).await {
            error!(error = %err, "push registration call failed");
            self.set_state(RegistrationState::Unregistered);
            return Err(ClientError::Registration(err));
        }
        info!("registered for push notifications");
        Ok(())
    }

    async fn acquire_permission(&self) -> Result<PermissionState, PlatformError> {
        let permission = self.inner.platform.request_permissions().await?;
        if permission != PermissionState::Prompt {
            return Ok(permission);
        }
        debug!("permission undecided, asking again");
        self.inner.platform.request_permissions().await
    }

    fn set_state(&self, next: RegistrationState) {
        *lock(&self.inner.state) = next;
    }

    /// 处理一条平台事件
    pub fn handle_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::TokenIssued(token) => {
                info!(%token, "push registration success");
                {
                    let mut state = lock(&self.inner.state);
                    if matches!(
                        *state,
                        RegistrationState::Registering | RegistrationState::Registered(_)
                    ) {
                        *state = RegistrationState::Registered(token.clone());
                    }
                }
                self.inner.token.send_replace(Some(token));
            }
            PlatformEvent::RegistrationFailed(reason) => {
                error!(%reason, "error on push registration");
            }
            PlatformEvent::NotificationReceived(notification) => {
                debug!(title = ?notification.title, "push notification received");
                self.record(notification, None);
            }
            PlatformEvent::NotificationTapped {
                action_id,
                notification,
            } => {
                debug!(%action_id, title = ?notification.title, "push action performed");
                self.record(notification, Some(action_id));
            }
        }
    }

    fn record(&self, notification: InboundNotification, action_id: Option<String>) {
        let InboundNotification { title, body, data } = notification;
        let record = match action_id {
            Some(action_id) => NotificationRecord::tapped(title, body, data, action_id),
            None => NotificationRecord::received(title, body, data),
        };
        lock(&self.inner.history).prepend(record);
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.borrow().clone()
    }

    /// 订阅令牌变化，新订阅者立即看到当前值
    pub fn subscribe_token(&self) -> watch::Receiver<Option<String>> {
        self.inner.token.subscribe()
    }

    /// 最新的记录在前
    pub fn notification_history(&self) -> Vec<NotificationRecord> {
        lock(&self.inner.history).records.iter().cloned().collect()
    }

    pub fn clear_notification_history(&self) {
        lock(&self.inner.history).records.clear();
    }

    pub fn registration_state(&self) -> RegistrationState {
        lock(&self.inner.state).clone()
    }
}

async fn listen(service: PushNotificationService, mut events: mpsc::UnboundedReceiver<PlatformEvent>) {
    while let Some(event) = events.recv().await {
        service.handle_event(event);
    }
    debug!("platform event stream closed");
}

/// 格式化通知显示
pub fn format_record(record: &NotificationRecord) -> String {
    let mut text = format!(
        "{} - {}\nReceived: {}",
        record.title.as_deref().unwrap_or("(no title)"),
        record.body.as_deref().unwrap_or(""),
        record.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    if record.tapped {
        match &record.action_id {
            Some(action_id) => text.push_str(&format!(" (tapped: {action_id})")),
            None => text.push_str(" (tapped)"),
        }
    }
    text
}
