use contracts::domain::a001_cart::{cart_count, cart_total, normalize_cart, CartItem};
use contracts::shared::ids::EntityId;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;

use super::api;
use crate::shared::clock::now_millis;
use crate::shared::config::AppConfig;
use crate::shared::events::{EventSink, StoreEvent};
use crate::shared::http::{ApiClient, ApiError};
use crate::shared::storage::{keys, load_json, save_json, SharedStorage};

/// The signed-in user's cart.
///
/// Every mutation goes to the server first and is followed by a full
/// re-fetch, so `items` always mirrors the server (or, offline, the last
/// cached snapshot).
#[derive(Clone)]
pub struct CartStore {
    pub items: RwSignal<Vec<CartItem>>,
    pub loading: RwSignal<bool>,
    user: RwSignal<Option<UserProfile>>,
    client: ApiClient,
    storage: SharedStorage,
    config: AppConfig,
    events: EventSink,
}

impl CartStore {
    pub fn new(
        user: RwSignal<Option<UserProfile>>,
        client: ApiClient,
        storage: SharedStorage,
        config: AppConfig,
        events: EventSink,
    ) -> Self {
        Self {
            items: RwSignal::new(Vec::new()),
            loading: RwSignal::new(false),
            user,
            client,
            storage,
            config,
            events,
        }
    }

    fn require_user(&self) -> Result<EntityId, ApiError> {
        self.user
            .with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
            .ok_or(ApiError::Unauthenticated)
    }

    fn persist(&self, user_id: &EntityId, items: &[CartItem]) {
        save_json(self.storage.as_ref(), &keys::cart(user_id), items);
    }

    /// Load the cart for `user`. Never fails: on error the last cached
    /// snapshot (or an empty cart) is shown.
    pub async fn fetch_cart(&self, user: Option<&UserProfile>) {
        let Some(user) = user else {
            self.items.set(Vec::new());
            return;
        };

        self.loading.set(true);
        match api::fetch_cart(&self.client).await {
            Ok(payload) => {
                let items = normalize_cart(&payload);
                self.persist(&user.id, &items);
                self.items.set(items);
            }
            Err(e) => {
                log::warn!("Failed to fetch cart, using cached copy: {}", e);
                let cached: Vec<CartItem> =
                    load_json(self.storage.as_ref(), &keys::cart(&user.id)).unwrap_or_default();
                self.items.set(cached);
            }
        }
        self.loading.set(false);
    }

    async fn refetch(&self) {
        let user = self.user.get_untracked();
        self.fetch_cart(user.as_ref()).await;
    }

    /// `identifier` is a product id or slug; `name` is only used for logging.
    pub async fn add_to_cart(
        &self,
        identifier: &str,
        quantity: u32,
        name: &str,
    ) -> Result<(), ApiError> {
        let user_id = self.require_user()?;
        api::add_item(&self.client, identifier, quantity)
            .await
            .map_err(|e| {
                log::error!("Failed to add {} to cart: {}", name, e);
                e
            })?;
        log::info!("Added {} x{} to cart", name, quantity);
        self.refetch().await;
        self.maybe_remind(&user_id);
        Ok(())
    }

    /// Emit a cart reminder when the cart is big enough and none was sent to
    /// this user within the cooldown.
    fn maybe_remind(&self, user_id: &EntityId) {
        let count = self.cart_count();
        if count < self.config.cart_reminder_threshold {
            return;
        }
        let key = keys::cart_reminder(user_id);
        let now = now_millis();
        let last = self
            .storage
            .get_item(&key)
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(last) = last {
            if now.saturating_sub(last) < self.config.cart_reminder_cooldown_ms {
                return;
            }
        }
        self.storage.set_item(&key, &now.to_string());
        self.events.emit(StoreEvent::CartReminder {
            user_id: user_id.clone(),
            item_count: count,
        });
    }

    /// Cart row id for an identifier that may also be a product id or slug.
    fn row_id(&self, identifier: &str) -> EntityId {
        self.items
            .with_untracked(|items| {
                items
                    .iter()
                    .find(|i| i.matches(identifier))
                    .map(|i| i.id.clone())
            })
            .unwrap_or_else(|| EntityId::new(identifier))
    }

    /// Set a line's quantity; zero removes the line.
    pub async fn update_qty(&self, identifier: &str, quantity: u32) -> Result<(), ApiError> {
        self.require_user()?;
        if quantity == 0 {
            return self.remove_from_cart(identifier).await;
        }
        api::update_item(&self.client, self.row_id(identifier), quantity)
            .await
            .map_err(|e| {
                log::error!("Failed to update cart item {}: {}", identifier, e);
                e
            })?;
        self.refetch().await;
        Ok(())
    }

    pub async fn remove_from_cart(&self, identifier: &str) -> Result<(), ApiError> {
        self.require_user()?;
        api::remove_item(&self.client, self.row_id(identifier))
            .await
            .map_err(|e| {
                log::error!("Failed to remove cart item {}: {}", identifier, e);
                e
            })?;
        self.refetch().await;
        Ok(())
    }

    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let user_id = self.require_user()?;
        api::clear(&self.client).await.map_err(|e| {
            log::error!("Failed to clear cart: {}", e);
            e
        })?;
        self.items.set(Vec::new());
        self.persist(&user_id, &[]);
        Ok(())
    }

    /// Place an order from the server-side cart.
    pub async fn checkout(&self) -> Result<Option<EntityId>, ApiError> {
        self.require_user()?;
        let response = api::checkout(&self.client).await.map_err(|e| {
            log::error!("Checkout failed: {}", e);
            e
        })?;
        if let Some(order_id) = response.order_id.clone() {
            log::info!("Checkout created order {}", order_id);
            self.events.emit(StoreEvent::OrderPlaced { order_id });
        }
        self.refetch().await;
        Ok(response.order_id)
    }

    /// Units in the cart (not lines).
    pub fn cart_count(&self) -> u32 {
        self.items.with(|items| cart_count(items))
    }

    pub fn cart_total(&self) -> f64 {
        self.items.with(|items| cart_total(items))
    }
}

/// Hook to access the cart store
pub fn use_cart() -> CartStore {
    use_context::<CartStore>().expect("CartStore not found in component tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::events::testing::recording_sink;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::{KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct Fixture {
        store: CartStore,
        mock: Arc<MockTransport>,
        storage: Arc<MemoryStorage>,
        events: Arc<Mutex<Vec<StoreEvent>>>,
    }

    fn user(id: i64) -> UserProfile {
        serde_json::from_value(json!({"id": id, "business_name": "Acme Deli"})).unwrap()
    }

    fn fixture(signed_in: bool) -> Fixture {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(keys::ACCESS, "tok");
        let client = ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage.clone()));
        let (sink, events) = recording_sink();
        let current = RwSignal::new(signed_in.then(|| user(1)));
        let store = CartStore::new(current, client, storage.clone(), AppConfig::default(), sink);
        Fixture {
            store,
            mock,
            storage,
            events,
        }
    }

    fn widget_row(quantity: u32) -> serde_json::Value {
        json!({
            "id": 10,
            "quantity": quantity,
            "product": {"id": 5, "slug": "sku-123", "name": "Widget", "price": "2.50"}
        })
    }

    #[test]
    fn test_every_cart_shape_normalizes_the_same() {
        let shapes = [
            json!([widget_row(2)]),
            json!({"items": [widget_row(2)]}),
            json!({"results": [widget_row(2)]}),
            json!({"cart": {"items": [widget_row(2)]}}),
        ];
        let mut seen = Vec::new();
        for shape in shapes {
            let f = fixture(true);
            f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, shape));
            block_on(f.store.fetch_cart(Some(&user(1))));
            seen.push(f.store.items.get_untracked());
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].name, "Widget");
    }

    #[test]
    fn test_fetch_falls_back_to_cache_then_empty() {
        let f = fixture(true);
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(3)])));
        f.mock.on(Method::Get, api::CART_PATH, MockReply::Network);

        block_on(f.store.fetch_cart(Some(&user(1))));
        assert!(f.storage.contains("cart_1"));
        block_on(f.store.fetch_cart(Some(&user(1))));
        assert_eq!(f.store.cart_count(), 3);

        // No cache for another user: empty.
        block_on(f.store.fetch_cart(Some(&user(2))));
        assert!(f.store.items.get_untracked().is_empty());
    }

    #[test]
    fn test_fetch_without_user_is_empty_and_offline() {
        let f = fixture(false);
        block_on(f.store.fetch_cart(None));
        assert!(f.store.items.get_untracked().is_empty());
        assert_eq!(f.mock.total_calls(), 0);
    }

    #[test]
    fn test_mutations_require_user() {
        let f = fixture(false);
        let err = block_on(f.store.add_to_cart("sku-123", 1, "Widget")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
        assert!(block_on(f.store.clear_cart()).is_err());
        assert!(block_on(f.store.checkout()).is_err());
        assert_eq!(f.mock.total_calls(), 0);
    }

    #[test]
    fn test_add_to_cart_reminds_once_per_cooldown() {
        let f = fixture(true);
        f.mock.on(Method::Post, api::CART_ADD_PATH, MockReply::json(201, json!({})));
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(2)])));
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(4)])));

        assert_eq!(f.store.cart_count(), 0);
        block_on(f.store.add_to_cart("sku-123", 2, "Widget")).unwrap();
        assert_eq!(f.store.cart_count(), 2);
        assert!((f.store.cart_total() - 5.0).abs() < 1e-9);

        let sent = f.mock.last_request(Method::Post, api::CART_ADD_PATH).unwrap();
        assert_eq!(sent.body, Some(json!({"product": "sku-123", "quantity": 2})));

        block_on(f.store.add_to_cart("sku-123", 2, "Widget")).unwrap();
        assert_eq!(f.store.cart_count(), 4);

        let events = f.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![StoreEvent::CartReminder {
                user_id: EntityId::new("1"),
                item_count: 2
            }]
        );
        assert!(f.storage.contains("cart_reminder_1"));
    }

    #[test]
    fn test_reminder_fires_again_after_cooldown() {
        let f = fixture(true);
        let stale = now_millis() - 2 * 60 * 60 * 1000;
        f.storage.set_item("cart_reminder_1", &stale.to_string());
        f.mock.on(Method::Post, api::CART_ADD_PATH, MockReply::json(201, json!({})));
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(2)])));

        block_on(f.store.add_to_cart("sku-123", 2, "Widget")).unwrap();
        assert_eq!(f.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_update_to_zero_removes_by_row_id() {
        let f = fixture(true);
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(2)])));
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([])));
        f.mock.on(Method::Post, api::CART_REMOVE_PATH, MockReply::json(200, json!({})));
        block_on(f.store.fetch_cart(Some(&user(1))));

        block_on(f.store.update_qty("sku-123", 0)).unwrap();

        assert_eq!(f.mock.calls(Method::Post, api::CART_UPDATE_PATH), 0);
        let removed = f.mock.last_request(Method::Post, api::CART_REMOVE_PATH).unwrap();
        assert_eq!(removed.body, Some(json!({"item_id": 10})));
        assert_eq!(f.store.cart_count(), 0);
    }

    #[test]
    fn test_failed_update_is_returned() {
        let f = fixture(true);
        f.mock.on(Method::Post, api::CART_UPDATE_PATH, MockReply::status(500));
        let err = block_on(f.store.update_qty("10", 3)).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn test_clear_cart_empties_state_and_cache() {
        let f = fixture(true);
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!([widget_row(2)])));
        f.mock.on(Method::Post, api::CART_CLEAR_PATH, MockReply::status(204));
        block_on(f.store.fetch_cart(Some(&user(1))));

        block_on(f.store.clear_cart()).unwrap();
        assert_eq!(f.store.cart_count(), 0);
        assert_eq!(f.storage.get_item("cart_1").as_deref(), Some("[]"));
        assert_eq!(f.mock.calls(Method::Get, api::CART_PATH), 1);
    }

    #[test]
    fn test_checkout_emits_order_placed() {
        let f = fixture(true);
        f.mock.on(
            Method::Post,
            api::CHECKOUT_PATH,
            MockReply::json(201, json!({"order": {"id": 99}})),
        );
        f.mock.on(Method::Get, api::CART_PATH, MockReply::json(200, json!({"items": []})));

        let order_id = block_on(f.store.checkout()).unwrap();
        assert_eq!(order_id, Some(EntityId::new("99")));
        assert_eq!(
            *f.events.lock().unwrap(),
            vec![StoreEvent::OrderPlaced {
                order_id: EntityId::new("99")
            }]
        );
        assert_eq!(f.store.cart_count(), 0);
    }
}
