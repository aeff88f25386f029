use contracts::shared::ids::EntityId;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

use crate::domain::a001_cart::store::CartStore;
use crate::domain::a002_smart_list::store::SmartListStore;
use crate::domain::a003_order::store::OrdersStore;
use crate::layout::navigation::NavContext;
use crate::routes::routes::AppRoutes;
use crate::shared::config::AppConfig;
use crate::shared::events::{EventSink, StoreEvent};
use crate::shared::http::{ApiClient, GlooTransport};
use crate::shared::storage::{app_storage, SharedStorage};
use crate::shared::theme::ThemeStore;
use crate::shared::toast::ToastService;
use crate::system::auth::context::AuthStore;
use crate::system::auth::session::SessionService;
use crate::system::notifications::store::NotificationStore;

/// Every client-side store, wired to one API client and one storage.
#[derive(Clone)]
pub struct Stores {
    pub auth: AuthStore,
    pub cart: CartStore,
    pub lists: SmartListStore,
    pub orders: OrdersStore,
    pub notifications: NotificationStore,
    pub theme: ThemeStore,
}

/// Synchronous reaction to a store event. Returns the order to refetch
/// history for, if any.
pub fn route_event(
    event: &StoreEvent,
    notifications: &NotificationStore,
    orders: &OrdersStore,
) -> Option<EntityId> {
    notifications.handle_event(event);
    match event {
        StoreEvent::OrderPlaced { order_id } => {
            orders.mark_new(order_id.clone());
            Some(order_id.clone())
        }
        StoreEvent::CartReminder { .. } => None,
    }
}

impl Stores {
    pub fn new(client: ApiClient, storage: SharedStorage, config: AppConfig) -> Self {
        let auth = AuthStore::new(client.clone(), storage.clone());
        let user = auth.user;
        let orders = OrdersStore::new(user, client.clone(), storage.clone());
        let notifications = NotificationStore::new(user, client.clone(), config.clone());

        let events = {
            let orders = orders.clone();
            let notifications = notifications.clone();
            EventSink::new(move |event| {
                if route_event(&event, &notifications, &orders).is_some() {
                    let orders = orders.clone();
                    spawn_local(async move {
                        let current = user.get_untracked();
                        orders.fetch_orders(current.as_ref()).await;
                    });
                }
            })
        };

        Self {
            cart: CartStore::new(user, client.clone(), storage.clone(), config, events.clone()),
            lists: SmartListStore::new(user, client.clone(), storage.clone(), events),
            theme: ThemeStore::new(user, client, storage),
            auth,
            orders,
            notifications,
        }
    }

    fn provide(&self) {
        provide_context(self.auth.clone());
        provide_context(self.cart.clone());
        provide_context(self.lists.clone());
        provide_context(self.orders.clone());
        provide_context(self.notifications.clone());
        provide_context(self.theme.clone());
    }

    /// Load (or clear) everything that belongs to `user`.
    pub async fn load_for(&self, user: Option<UserProfile>) {
        self.notifications.sync_user(user.as_ref());
        futures::join!(
            self.cart.fetch_cart(user.as_ref()),
            self.lists.fetch_lists(user.as_ref()),
            self.orders.fetch_orders(user.as_ref()),
            self.theme.resolve(user.as_ref()),
        );
    }
}

/// Any of these counts as user activity for the idle watchdog.
fn watch_activity(session: &SessionService) {
    let handles = [
        window_event_listener(leptos::ev::click, {
            let session = session.clone();
            move |_| session.touch()
        }),
        window_event_listener(leptos::ev::keydown, {
            let session = session.clone();
            move |_| session.touch()
        }),
        window_event_listener(leptos::ev::touchstart, {
            let session = session.clone();
            move |_| session.touch()
        }),
        window_event_listener(leptos::ev::scroll, {
            let session = session.clone();
            move |_| session.touch()
        }),
    ];
    on_cleanup(move || {
        for handle in handles {
            handle.remove();
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let config = AppConfig::from_location();
    let storage = app_storage();
    let session = SessionService::new(
        config.clone(),
        storage.clone(),
        Arc::new(GlooTransport::new(config.request_timeout_ms)),
    );
    let client = session.client();
    let toast = ToastService::new(config.toast_ms);
    let stores = Stores::new(client.clone(), storage, config);

    provide_context(client);
    provide_context(toast.clone());
    provide_context(NavContext::new());
    stores.provide();

    {
        let auth = stores.auth.clone();
        session.init(move || {
            auth.logout();
            toast.error("Your session has expired. Please sign in again.");
        });
    }
    watch_activity(&session);
    on_cleanup({
        let session = session.clone();
        let notifications = stores.notifications.clone();
        move || {
            notifications.sync_user(None);
            session.teardown();
        }
    });

    {
        let auth = stores.auth.clone();
        spawn_local(async move { auth.fetch_user().await });
    }

    // Reload per-user state whenever a different user signs in or out.
    let user = stores.auth.user;
    Effect::new(move |previous: Option<Option<EntityId>>| {
        let current = user.get();
        let id = current.as_ref().map(|u| u.id.clone());
        if previous.as_ref() == Some(&id) {
            return id;
        }
        log::debug!("session user changed to {:?}", id);
        let stores = stores.clone();
        spawn_local(async move { stores.load_for(current).await });
        id
    });

    view! {
        <AppRoutes />
    }
}
