//! Session lifetime: token refresh hook and inactivity logout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::shared::clock::now_millis;
use crate::shared::config::AppConfig;
use crate::shared::http::{ApiClient, Transport};
use crate::shared::scheduler::ScheduledTask;
use crate::shared::storage::SharedStorage;
use crate::system::auth::storage::TokenStore;

/// One per app. Owns the API client (and with it the refresh gate) plus the
/// inactivity watchdog, and is handed to every store that needs the network.
#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
    config: AppConfig,
    last_activity: Arc<AtomicU64>,
    watchdog: Arc<Mutex<Option<ScheduledTask>>>,
}

impl SessionService {
    pub fn new(config: AppConfig, storage: SharedStorage, transport: Arc<dyn Transport>) -> Self {
        let client = ApiClient::new(config.api_origin.clone(), transport, TokenStore::new(storage));
        Self {
            client,
            config,
            last_activity: Arc::new(AtomicU64::new(now_millis())),
            watchdog: Arc::new(Mutex::new(None)),
        }
    }

    pub fn client(&self) -> ApiClient {
        self.client.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Install `on_expired` (called when tokens cannot be renewed or the
    /// user has been idle too long) and start the inactivity watchdog.
    pub fn init(&self, on_expired: impl Fn() + Send + Sync + 'static) {
        let hook: Arc<dyn Fn() + Send + Sync> = Arc::new(on_expired);
        self.client.set_session_expired_hook(Some(hook.clone()));
        self.touch();

        let this = self.clone();
        let task = ScheduledTask::every(self.config.idle_check_ms, move || {
            let this = this.clone();
            let hook = hook.clone();
            async move {
                if this.client.tokens().has_session() && this.is_idle(now_millis()) {
                    log::info!("Signing out after {} ms of inactivity", this.config.idle_timeout_ms);
                    this.client.tokens().clear();
                    hook();
                }
            }
        });
        *self.watchdog.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        log::debug!("session service started");
    }

    /// Record user activity now.
    pub fn touch(&self) {
        self.record_activity_at(now_millis());
    }

    pub fn record_activity_at(&self, millis: u64) {
        self.last_activity.store(millis, Ordering::Relaxed);
    }

    pub fn is_idle(&self, now: u64) -> bool {
        now.saturating_sub(self.last_activity.load(Ordering::Relaxed)) >= self.config.idle_timeout_ms
    }

    /// Stop the watchdog and detach the expiry hook.
    pub fn teardown(&self) {
        let task = self
            .watchdog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel();
        }
        self.client.set_session_expired_hook(None);
        log::debug!("session service stopped");
    }
}
