use contracts::domain::a001_cart::CartItem;
use contracts::domain::a003_order::{normalize_orders, Order, PlaceOrderRequest};
use contracts::shared::ids::EntityId;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;
use std::collections::HashSet;

use super::api;
use crate::shared::http::{ApiClient, ApiError};
use crate::shared::storage::{keys, load_json, save_json, SharedStorage};

/// Order history plus the set of orders placed in this session that the
/// customer has not opened yet. That set lives in memory only.
#[derive(Clone)]
pub struct OrdersStore {
    pub orders: RwSignal<Vec<Order>>,
    pub new_order_ids: RwSignal<HashSet<EntityId>>,
    pub loading: RwSignal<bool>,
    user: RwSignal<Option<UserProfile>>,
    client: ApiClient,
    storage: SharedStorage,
}

impl OrdersStore {
    pub fn new(user: RwSignal<Option<UserProfile>>, client: ApiClient, storage: SharedStorage) -> Self {
        Self {
            orders: RwSignal::new(Vec::new()),
            new_order_ids: RwSignal::new(HashSet::new()),
            loading: RwSignal::new(false),
            user,
            client,
            storage,
        }
    }

    fn require_user(&self) -> Result<EntityId, ApiError> {
        self.user
            .with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
            .ok_or(ApiError::Unauthenticated)
    }

    fn persist(&self, user_id: &EntityId, orders: &[Order]) {
        save_json(self.storage.as_ref(), &keys::orders(user_id), orders);
    }

    pub async fn fetch_orders(&self, user: Option<&UserProfile>) {
        let Some(user) = user else {
            self.orders.set(Vec::new());
            self.new_order_ids.set(HashSet::new());
            return;
        };

        self.loading.set(true);
        match api::fetch_orders(&self.client).await {
            Ok(payload) => {
                let orders = normalize_orders(&payload);
                self.persist(&user.id, &orders);
                self.orders.set(orders);
            }
            Err(e) => {
                log::warn!("Failed to fetch orders, using cached copy: {}", e);
                let cached: Vec<Order> =
                    load_json(self.storage.as_ref(), &keys::orders(&user.id)).unwrap_or_default();
                self.orders.set(cached);
            }
        }
        self.loading.set(false);
    }

    /// Submit `cart` as a new order and put it at the top of the history.
    pub async fn place_order(&self, cart: &[CartItem]) -> Result<Order, ApiError> {
        let user_id = self.require_user()?;
        let request = PlaceOrderRequest::from_cart(cart);
        let order = api::place_order(&self.client, &request).await.map_err(|e| {
            log::error!("Failed to place order: {}", e);
            e
        })?;
        log::info!("Order {} placed", order.id);

        self.orders.update(|orders| {
            orders.retain(|o| o.id != order.id);
            orders.insert(0, order.clone());
        });
        self.orders
            .with_untracked(|orders| self.persist(&user_id, orders));
        self.mark_new(order.id.clone());
        Ok(order)
    }

    /// Flag an order as unseen, e.g. one created through checkout elsewhere.
    pub fn mark_new(&self, order_id: EntityId) {
        self.new_order_ids.update(|ids| {
            ids.insert(order_id);
        });
    }

    pub fn mark_order_as_viewed(&self, order_id: &EntityId) {
        self.new_order_ids.update(|ids| {
            ids.remove(order_id);
        });
    }

    pub fn is_new(&self, order_id: &EntityId) -> bool {
        self.new_order_ids.with(|ids| ids.contains(order_id))
    }

    pub fn total_orders_count(&self) -> usize {
        self.orders.with(Vec::len)
    }

    pub fn new_orders_count(&self) -> usize {
        self.new_order_ids.with(HashSet::len)
    }
}

/// Hook to access the orders store
pub fn use_orders() -> OrdersStore {
    use_context::<OrdersStore>().expect("OrdersStore not found in component tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_cart::api::CHECKOUT_PATH;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::{KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn user() -> UserProfile {
        serde_json::from_value(json!({"id": 3})).unwrap()
    }

    fn setup() -> (OrdersStore, Arc<MockTransport>, Arc<MemoryStorage>) {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(keys::ACCESS, "tok");
        let client = ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage.clone()));
        let store = OrdersStore::new(RwSignal::new(Some(user())), client, storage.clone());
        (store, mock, storage)
    }

    fn cart_line() -> CartItem {
        CartItem {
            id: EntityId::new("10"),
            product_id: EntityId::new("5"),
            slug: None,
            name: "Widget".into(),
            image: String::new(),
            price: 2.5,
            quantity: 2,
        }
    }

    #[test]
    fn test_fetch_orders_shapes_and_cache() {
        let (store, mock, storage) = setup();
        mock.on(
            Method::Get,
            api::USER_ORDERS_PATH,
            MockReply::json(200, json!({"orders": [{"id": 1}, {"id": 2}]})),
        );
        mock.on(Method::Get, api::USER_ORDERS_PATH, MockReply::Timeout);

        block_on(store.fetch_orders(Some(&user())));
        assert_eq!(store.total_orders_count(), 2);
        assert!(storage.contains("orders_3"));

        block_on(store.fetch_orders(Some(&user())));
        assert_eq!(store.total_orders_count(), 2);
    }

    #[test]
    fn test_place_order_prepends_and_flags_new() {
        let (store, mock, _) = setup();
        mock.on(
            Method::Get,
            api::USER_ORDERS_PATH,
            MockReply::json(200, json!([{"id": 1}])),
        );
        mock.on(
            Method::Post,
            CHECKOUT_PATH,
            MockReply::json(201, json!({"order": {"id": 7, "status": "pending"}})),
        );
        block_on(store.fetch_orders(Some(&user())));

        let order = block_on(store.place_order(&[cart_line()])).unwrap();
        assert_eq!(order.id.as_str(), "7");
        assert_eq!(store.orders.get_untracked()[0].id.as_str(), "7");
        assert_eq!(store.total_orders_count(), 2);
        assert!(store.is_new(&order.id));
        assert_eq!(store.new_orders_count(), 1);

        let sent = mock.last_request(Method::Post, CHECKOUT_PATH).unwrap();
        assert_eq!(
            sent.body,
            Some(json!({"items": [{"product_id": 5, "quantity": 2, "price": 2.5}], "total": 5.0}))
        );

        store.mark_order_as_viewed(&order.id);
        assert!(!store.is_new(&order.id));
        assert_eq!(store.new_orders_count(), 0);
    }

    #[test]
    fn test_place_order_failure_is_returned() {
        let (store, mock, _) = setup();
        mock.on(Method::Post, CHECKOUT_PATH, MockReply::Network);
        let err = block_on(store.place_order(&[cart_line()])).unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(store.total_orders_count(), 0);
        assert_eq!(store.new_orders_count(), 0);
    }

    #[test]
    fn test_new_orders_are_not_persisted() {
        let (store, _, storage) = setup();
        store.mark_new(EntityId::new("8"));
        assert!(storage.keys().iter().all(|k| !k.contains("new")));
        block_on(store.fetch_orders(None));
        assert_eq!(store.new_orders_count(), 0);
    }
}
