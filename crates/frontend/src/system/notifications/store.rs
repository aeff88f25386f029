//! Notification inbox with background polling.

use contracts::domain::a005_notification::{
    normalize_notifications, unread_count, Notification, NotificationKind,
};
use contracts::shared::ids::EntityId;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::api;
use crate::shared::audio::play_chime;
use crate::shared::clock::{now_millis, to_rfc3339};
use crate::shared::config::AppConfig;
use crate::shared::events::StoreEvent;
use crate::shared::http::{ApiClient, ApiError, ErrorKind};
use crate::shared::scheduler::{ScheduledTask, TaskRuntime};

const LOCAL_PREFIX: &str = "local-";

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationStatus {
    /// No user; inbox empty, nothing polling.
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

pub fn load_error_message(error: &ApiError) -> String {
    match error.kind() {
        ErrorKind::Unauthenticated => "Your session has expired. Please sign in again.",
        ErrorKind::NotFound => "Notifications are not available yet.",
        ErrorKind::Timeout => "Notifications took too long to load.",
        ErrorKind::Network => "Cannot reach the server to load notifications.",
        ErrorKind::Server | ErrorKind::Generic => "Failed to load notifications.",
    }
    .to_string()
}

#[derive(Default)]
struct PollState {
    user_id: Option<EntityId>,
    task: Option<ScheduledTask>,
}

#[derive(Clone)]
pub struct NotificationStore {
    pub items: RwSignal<Vec<Notification>>,
    pub unread: RwSignal<usize>,
    pub status: RwSignal<NotificationStatus>,
    /// Ids removed on this device; kept out of later polls.
    dismissed: RwSignal<HashSet<EntityId>>,
    user: RwSignal<Option<UserProfile>>,
    client: ApiClient,
    config: AppConfig,
    runtime: TaskRuntime,
    poll: Arc<Mutex<PollState>>,
}

impl NotificationStore {
    pub fn new(user: RwSignal<Option<UserProfile>>, client: ApiClient, config: AppConfig) -> Self {
        Self {
            items: RwSignal::new(Vec::new()),
            unread: RwSignal::new(0),
            status: RwSignal::new(NotificationStatus::Idle),
            dismissed: RwSignal::new(HashSet::new()),
            user,
            client,
            config,
            runtime: TaskRuntime::browser(),
            poll: Arc::new(Mutex::new(PollState::default())),
        }
    }

    pub fn with_runtime(mut self, runtime: TaskRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    fn current_user_id(&self) -> Option<EntityId> {
        self.user.with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
    }

    fn reset(&self) {
        self.items.set(Vec::new());
        self.unread.set(0);
        self.dismissed.set(HashSet::new());
        self.status.set(NotificationStatus::Idle);
    }

    fn recount(&self) {
        let unread = self.items.with_untracked(|items| unread_count(items));
        self.unread.set(unread);
    }

    /// Start polling for a newly signed-in user, stop it on sign-out.
    /// Calling again for the same user is a no-op.
    pub fn sync_user(&self, user: Option<&UserProfile>) {
        let user_id = user.map(|u| u.id.clone());
        let mut poll = self.poll.lock().unwrap_or_else(PoisonError::into_inner);
        if poll.user_id == user_id {
            return;
        }
        if let Some(task) = poll.task.take() {
            task.cancel();
        }
        poll.user_id = user_id.clone();

        let Some(user_id) = user_id else {
            drop(poll);
            log::debug!("notification polling stopped");
            self.reset();
            return;
        };

        log::debug!(
            "notification polling every {} ms for user {}",
            self.config.notification_poll_ms,
            user_id
        );
        let this = self.clone();
        poll.task = Some(ScheduledTask::every_on(
            &self.runtime,
            self.config.notification_poll_ms,
            move || {
                let this = this.clone();
                async move { this.load_notifications().await }
            },
        ));
        drop(poll);

        let this = self.clone();
        self.runtime.spawn(async move { this.load_notifications().await });
    }

    /// Pull the inbox. Without a user the store is reset and nothing is sent.
    /// A reply that lands after the user changed is dropped.
    pub async fn load_notifications(&self) {
        let Some(requested_for) = self.current_user_id() else {
            self.reset();
            return;
        };

        self.status.set(NotificationStatus::Loading);
        let result = api::fetch_notifications(&self.client).await;
        if self.current_user_id().as_ref() != Some(&requested_for) {
            log::debug!("dropping notifications fetched for user {}", requested_for);
            return;
        }
        match result {
            Ok(payload) => {
                let dismissed = self.dismissed.get_untracked();
                let fetched: Vec<Notification> = normalize_notifications(&payload)
                    .into_iter()
                    .filter(|n| !dismissed.contains(&n.id))
                    .collect();
                self.items.update(|items| {
                    // Client-side notices never come back from the server.
                    let mut merged: Vec<Notification> = items
                        .drain(..)
                        .filter(|n| n.id.as_str().starts_with(LOCAL_PREFIX))
                        .collect();
                    merged.extend(fetched);
                    *items = merged;
                });
                self.recount();
                self.status.set(NotificationStatus::Loaded);
            }
            Err(e) => {
                log::warn!("Failed to load notifications: {}", e);
                self.status.set(NotificationStatus::Errored(load_error_message(&e)));
            }
        }
    }

    /// Put a notification at the top of the inbox and chime.
    pub fn add_notification(&self, notification: Notification) {
        let unread = !notification.is_read;
        self.items.update(|items| items.insert(0, notification));
        if unread {
            self.unread.update(|n| *n += 1);
        }
        play_chime();
    }

    fn next_local_id(&self) -> String {
        format!("{}{}", LOCAL_PREFIX, uuid::Uuid::new_v4())
    }

    /// Turn a cross-store event into a client-side notification.
    pub fn handle_event(&self, event: &StoreEvent) {
        let created_at = to_rfc3339(now_millis());
        let notification = match event {
            StoreEvent::CartReminder { item_count, .. } => Notification::local(
                self.next_local_id(),
                NotificationKind::CartReminder,
                "Items waiting in your cart",
                format!("You have {} items in your cart. Ready to check out?", item_count),
                created_at,
            ),
            StoreEvent::OrderPlaced { order_id } => {
                let mut n = Notification::local(
                    self.next_local_id(),
                    NotificationKind::Order,
                    "Order placed",
                    format!("Order #{} has been placed.", order_id),
                    created_at,
                );
                n.order_id = Some(order_id.clone());
                n
            }
        };
        self.add_notification(notification);
    }

    /// Mark one notification read. Server failures are logged and the
    /// notification stays unread.
    pub async fn mark_as_read(&self, id: &EntityId) {
        let unread = self
            .items
            .with_untracked(|items| items.iter().any(|n| &n.id == id && !n.is_read));
        if !unread {
            return;
        }
        if !id.as_str().starts_with(LOCAL_PREFIX) {
            if let Err(e) = api::mark_read(&self.client, id).await {
                log::warn!("Failed to mark notification {} as read: {}", id, e);
                return;
            }
        }
        self.items.update(|items| {
            if let Some(n) = items.iter_mut().find(|n| &n.id == id) {
                n.is_read = true;
            }
        });
        self.unread.update(|n| *n = n.saturating_sub(1));
    }

    pub async fn mark_all_as_read(&self) {
        let unread: Vec<EntityId> = self.items.with_untracked(|items| {
            items
                .iter()
                .filter(|n| !n.is_read)
                .map(|n| n.id.clone())
                .collect()
        });
        for id in unread {
            self.mark_as_read(&id).await;
        }
    }

    /// Remove from this device only; the server copy is untouched.
    pub fn delete_notification(&self, id: &EntityId) {
        self.dismissed.update(|d| {
            d.insert(id.clone());
        });
        self.items.update(|items| items.retain(|n| &n.id != id));
        self.recount();
    }

    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

/// Hook to access the notification store
pub fn use_notifications() -> NotificationStore {
    use_context::<NotificationStore>().expect("NotificationStore not found in component tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::{keys, KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use crate::shared::scheduler::testing;
    use futures::executor::block_on;
    use futures::join;
    use serde_json::json;

    fn user() -> UserProfile {
        serde_json::from_value(json!({"id": 1})).unwrap()
    }

    fn setup(signed_in: bool) -> (NotificationStore, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(keys::ACCESS, "tok");
        let client = ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage));
        let current = RwSignal::new(signed_in.then(user));
        (NotificationStore::new(current, client, AppConfig::default()), mock)
    }

    fn inbox() -> serde_json::Value {
        json!({"results": [
            {"id": 1, "type": "order", "title": "Shipped", "is_read": false},
            {"id": 2, "type": "promotion", "title": "Sale", "is_read": true},
            {"id": 3, "type": null, "title": "Welcome", "is_read": "false"}
        ]})
    }

    #[test]
    fn test_no_user_is_idle_without_request() {
        let (store, mock) = setup(false);
        store.sync_user(None);
        block_on(store.load_notifications());
        assert_eq!(store.status.get_untracked(), NotificationStatus::Idle);
        assert!(store.items.get_untracked().is_empty());
        assert_eq!(store.unread.get_untracked(), 0);
        assert_eq!(mock.total_calls(), 0);
        assert!(!store.is_polling());
    }

    #[test]
    fn test_load_counts_unread() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        block_on(store.load_notifications());
        assert_eq!(store.status.get_untracked(), NotificationStatus::Loaded);
        assert_eq!(store.items.get_untracked().len(), 3);
        assert_eq!(store.unread.get_untracked(), 2);
    }

    #[test]
    fn test_single_object_payload() {
        let (store, mock) = setup(true);
        mock.on(
            Method::Get,
            api::NOTIFICATIONS_PATH,
            MockReply::json(200, json!({"id": 9, "title": "Hello"})),
        );
        block_on(store.load_notifications());
        assert_eq!(store.items.get_untracked().len(), 1);
        assert_eq!(store.unread.get_untracked(), 1);
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let errors = [
            ApiError::Unauthenticated,
            ApiError::NotFound,
            ApiError::Timeout,
            ApiError::Network("down".into()),
            ApiError::Generic("boom".into()),
        ];
        let messages: HashSet<String> = errors.iter().map(load_error_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_load_failure_sets_errored() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::Timeout);
        block_on(store.load_notifications());
        assert_eq!(
            store.status.get_untracked(),
            NotificationStatus::Errored("Notifications took too long to load.".into())
        );
    }

    #[test]
    fn test_mark_as_read_patches_and_floors() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        mock.on(Method::Patch, "/api/notifications/1/", MockReply::json(200, json!({})));
        block_on(store.load_notifications());

        block_on(store.mark_as_read(&EntityId::new("1")));
        block_on(store.mark_as_read(&EntityId::new("1")));
        assert_eq!(store.unread.get_untracked(), 1);
        assert_eq!(mock.calls(Method::Patch, "/api/notifications/1/"), 1);
        let sent = mock.last_request(Method::Patch, "/api/notifications/1/").unwrap();
        assert_eq!(sent.body, Some(json!({"is_read": true})));

        store.unread.set(0);
        mock.on(Method::Patch, "/api/notifications/3/", MockReply::json(200, json!({})));
        block_on(store.mark_as_read(&EntityId::new("3")));
        assert_eq!(store.unread.get_untracked(), 0);
    }

    #[test]
    fn test_mark_as_read_failure_only_logs() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        mock.on(Method::Patch, "/api/notifications/1/", MockReply::status(500));
        block_on(store.load_notifications());

        block_on(store.mark_as_read(&EntityId::new("1")));
        assert_eq!(store.unread.get_untracked(), 2);
    }

    #[test]
    fn test_mark_all_as_read() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        mock.on(Method::Patch, "/api/notifications/1/", MockReply::json(200, json!({})));
        mock.on(Method::Patch, "/api/notifications/3/", MockReply::json(200, json!({})));
        block_on(store.load_notifications());

        block_on(store.mark_all_as_read());
        assert_eq!(store.unread.get_untracked(), 0);
        assert_eq!(mock.calls(Method::Patch, "/api/notifications/2/"), 0);
    }

    #[test]
    fn test_events_become_local_notifications() {
        let (store, mock) = setup(true);
        store.handle_event(&StoreEvent::CartReminder {
            user_id: EntityId::new("1"),
            item_count: 3,
        });
        store.handle_event(&StoreEvent::OrderPlaced {
            order_id: EntityId::new("77"),
        });
        assert_eq!(store.unread.get_untracked(), 2);

        let items = store.items.get_untracked();
        assert_eq!(items[0].kind(), NotificationKind::Order);
        assert_eq!(items[0].order_id, Some(EntityId::new("77")));
        assert_eq!(items[1].kind(), NotificationKind::CartReminder);
        assert_ne!(items[0].id, items[1].id);

        // Local notices survive a poll and are read without a request.
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        block_on(store.load_notifications());
        assert_eq!(store.items.get_untracked().len(), 5);
        block_on(store.mark_as_read(&items[0].id));
        assert_eq!(mock.calls(Method::Patch, &api::notification_path(&items[0].id)), 0);
        assert_eq!(store.unread.get_untracked(), 3);
    }

    #[test]
    fn test_delete_is_local_and_sticks() {
        let (store, mock) = setup(true);
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));
        block_on(store.load_notifications());

        store.delete_notification(&EntityId::new("1"));
        assert_eq!(store.items.get_untracked().len(), 2);
        assert_eq!(store.unread.get_untracked(), 1);
        assert_eq!(mock.calls(Method::Delete, "/api/notifications/1/"), 0);

        block_on(store.load_notifications());
        assert_eq!(store.items.get_untracked().len(), 2);
    }

    #[test]
    fn test_polling_lifecycle() {
        let (store, mock) = setup(true);
        let store = store.with_runtime(testing::install());
        mock.on(Method::Get, api::NOTIFICATIONS_PATH, MockReply::json(200, inbox()));

        store.sync_user(Some(&user()));
        assert!(store.is_polling());
        testing::run_until_stalled();
        assert_eq!(mock.calls(Method::Get, api::NOTIFICATIONS_PATH), 1);
        assert_eq!(store.status.get_untracked(), NotificationStatus::Loaded);
        assert_eq!(store.unread.get_untracked(), 2);
        assert_eq!(testing::pending_timers(), 1);

        testing::fire_timers();
        testing::run_until_stalled();
        assert_eq!(mock.calls(Method::Get, api::NOTIFICATIONS_PATH), 2);

        // Same user again: no second load, no second loop.
        store.sync_user(Some(&user()));
        testing::run_until_stalled();
        assert_eq!(mock.calls(Method::Get, api::NOTIFICATIONS_PATH), 2);
        assert_eq!(testing::pending_timers(), 1);

        store.user.set(None);
        store.sync_user(None);
        assert!(!store.is_polling());
        assert_eq!(store.status.get_untracked(), NotificationStatus::Idle);
        assert!(store.items.get_untracked().is_empty());
        assert_eq!(store.unread.get_untracked(), 0);

        testing::fire_timers();
        testing::run_until_stalled();
        assert_eq!(mock.calls(Method::Get, api::NOTIFICATIONS_PATH), 2);
        assert_eq!(testing::pending_timers(), 0);
    }

    #[test]
    fn test_reply_after_sign_out_is_dropped() {
        let (store, mock) = setup(true);
        let store = store.with_runtime(testing::install());
        mock.on(
            Method::Get,
            api::NOTIFICATIONS_PATH,
            MockReply::json(200, inbox()).delayed(3),
        );
        store.sync_user(Some(&user()));

        block_on(async {
            join!(store.load_notifications(), async {
                store.user.set(None);
                store.sync_user(None);
            });
        });

        assert_eq!(mock.calls(Method::Get, api::NOTIFICATIONS_PATH), 1);
        assert!(store.items.get_untracked().is_empty());
        assert_eq!(store.unread.get_untracked(), 0);
        assert_eq!(store.status.get_untracked(), NotificationStatus::Idle);
        assert!(!store.is_polling());
    }
}
