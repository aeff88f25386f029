use contracts::domain::a002_smart_list::{
    enrich_from_catalog, normalize_smart_list, normalize_smart_lists, SmartList,
};
use contracts::domain::a004_product::Product;
use contracts::shared::ids::EntityId;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;

use super::api;
use crate::domain::a004_product::api::{self as product_api, ProductQuery};
use crate::shared::events::{EventSink, StoreEvent};
use crate::shared::http::{ApiClient, ApiError, ErrorKind};
use crate::shared::scheduler::TaskRuntime;
use crate::shared::storage::{keys, load_json, save_json, SharedStorage};

const FEATURE: &str = "SmartLists";

/// Result of a list load, for callers that want to explain an empty screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub success: bool,
    pub data: Vec<SmartList>,
    pub error: Option<String>,
    pub is_not_found: bool,
    pub is_timeout: bool,
}

/// User-facing text for a failed list load.
pub fn fetch_error_message(error: &ApiError) -> String {
    match error.kind() {
        ErrorKind::NotFound => format!("{} feature coming soon!", FEATURE),
        ErrorKind::Timeout => "Loading your lists took too long. Please try again.".to_string(),
        ErrorKind::Network => "Cannot reach the server. Check your connection.".to_string(),
        ErrorKind::Unauthenticated => "Please sign in to see your lists.".to_string(),
        ErrorKind::Server | ErrorKind::Generic => "Failed to load your lists.".to_string(),
    }
}

#[derive(Clone)]
pub struct SmartListStore {
    pub lists: RwSignal<Vec<SmartList>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    /// Catalog used to fill in items that only carry a product id.
    pub catalog: RwSignal<Vec<Product>>,
    user: RwSignal<Option<UserProfile>>,
    client: ApiClient,
    storage: SharedStorage,
    events: EventSink,
    runtime: TaskRuntime,
}

impl SmartListStore {
    pub fn new(
        user: RwSignal<Option<UserProfile>>,
        client: ApiClient,
        storage: SharedStorage,
        events: EventSink,
    ) -> Self {
        Self {
            lists: RwSignal::new(Vec::new()),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            catalog: RwSignal::new(Vec::new()),
            user,
            client,
            storage,
            events,
            runtime: TaskRuntime::browser(),
        }
    }

    pub fn with_runtime(mut self, runtime: TaskRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    fn require_user(&self) -> Result<EntityId, ApiError> {
        self.user
            .with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
            .ok_or(ApiError::Unauthenticated)
    }

    fn current_user_id(&self) -> Option<EntityId> {
        self.require_user().ok()
    }

    fn persist(&self, user_id: &EntityId, lists: &[SmartList]) {
        save_json(self.storage.as_ref(), &keys::smart_lists(user_id), lists);
    }

    fn persist_current(&self) {
        if let Some(user_id) = self.current_user_id() {
            self.lists.with_untracked(|lists| self.persist(&user_id, lists));
        }
    }

    /// Load the catalog once and keep it for enrichment. Later calls reuse it.
    pub async fn fetch_catalog(&self) -> Result<Vec<Product>, ApiError> {
        let cached = self.catalog.get_untracked();
        if !cached.is_empty() {
            return Ok(cached);
        }
        let products = product_api::fetch_catalog(&self.client, &ProductQuery::default()).await?;
        self.catalog.set(products.clone());

        let mut filled = 0;
        self.lists
            .update(|lists| filled = enrich_from_catalog(lists, &products));
        if filled > 0 {
            log::debug!("Filled {} smart list item(s) from the catalog", filled);
            self.persist_current();
        }
        Ok(products)
    }

    /// Load `user`'s lists. Never fails: errors fall back to the cached copy
    /// (or nothing) and are described in the returned outcome.
    pub async fn fetch_lists(&self, user: Option<&UserProfile>) -> FetchOutcome {
        let Some(user) = user else {
            self.lists.set(Vec::new());
            self.error.set(None);
            return FetchOutcome {
                success: true,
                ..FetchOutcome::default()
            };
        };

        self.loading.set(true);
        let outcome = match api::fetch_lists(&self.client).await {
            Ok(payload) => {
                let lists = self
                    .catalog
                    .with_untracked(|catalog| normalize_smart_lists(&payload, catalog));
                self.persist(&user.id, &lists);
                self.lists.set(lists.clone());
                self.error.set(None);
                FetchOutcome {
                    success: true,
                    data: lists,
                    ..FetchOutcome::default()
                }
            }
            Err(e) => {
                let message = fetch_error_message(&e);
                log::warn!("Failed to fetch smart lists: {}", e);
                let cached: Vec<SmartList> =
                    load_json(self.storage.as_ref(), &keys::smart_lists(&user.id))
                        .unwrap_or_default();
                self.lists.set(cached.clone());
                self.error.set(Some(message.clone()));
                FetchOutcome {
                    success: false,
                    data: cached,
                    error: Some(message),
                    is_not_found: e.is_not_found(),
                    is_timeout: e.is_timeout(),
                }
            }
        };
        self.loading.set(false);
        outcome
    }

    async fn refetch(&self) {
        let user = self.user.get_untracked();
        self.fetch_lists(user.as_ref()).await;
    }

    pub async fn create_list(&self, name: &str) -> Result<SmartList, ApiError> {
        self.require_user()?;
        let created = api::create_list(&self.client, name)
            .await
            .map_err(|e| {
                log::error!("Failed to create smart list {}: {}", name, e);
                e.feature_gate(FEATURE)
            })?;
        let list = self
            .catalog
            .with_untracked(|catalog| normalize_smart_list(&created, catalog));
        match list {
            Some(list) => {
                self.lists.update(|lists| lists.push(list.clone()));
                self.persist_current();
                Ok(list)
            }
            None => {
                // No usable body; pick the new list up from the server.
                self.refetch().await;
                self.lists
                    .with_untracked(|lists| lists.iter().rev().find(|l| l.name == name).cloned())
                    .ok_or_else(|| ApiError::Decode("created list missing from response".into()))
            }
        }
    }

    pub async fn delete_list(&self, list_id: &EntityId) -> Result<(), ApiError> {
        self.require_user()?;
        api::delete_list(&self.client, list_id).await.map_err(|e| {
            log::error!("Failed to delete smart list {}: {}", list_id, e);
            e.feature_gate(FEATURE)
        })?;
        self.lists.update(|lists| lists.retain(|l| &l.id != list_id));
        self.persist_current();
        Ok(())
    }

    pub async fn add_item_to_list(
        &self,
        list_id: &EntityId,
        product_id: EntityId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.require_user()?;
        api::add_item(&self.client, list_id, product_id, quantity.max(1))
            .await
            .map_err(|e| {
                log::error!("Failed to add item to smart list {}: {}", list_id, e);
                e.feature_gate(FEATURE)
            })?;
        self.refetch().await;
        Ok(())
    }

    pub async fn remove_item(&self, list_id: &EntityId, item_id: &EntityId) -> Result<(), ApiError> {
        self.require_user()?;
        api::remove_item(&self.client, list_id, item_id.clone())
            .await
            .map_err(|e| {
                log::error!("Failed to remove item {} from smart list {}: {}", item_id, list_id, e);
                e.feature_gate(FEATURE)
            })?;
        self.lists.update(|lists| {
            if let Some(list) = lists.iter_mut().find(|l| &l.id == list_id) {
                list.items.retain(|i| &i.id != item_id);
            }
        });
        self.persist_current();
        Ok(())
    }

    /// Order every item of a list. Returns the new order id when the server
    /// reports one.
    pub async fn order_all(&self, list_id: &EntityId) -> Result<Option<EntityId>, ApiError> {
        self.require_user()?;
        let response = api::order_all(&self.client, list_id).await.map_err(|e| {
            log::error!("Failed to order smart list {}: {}", list_id, e);
            e.feature_gate(FEATURE)
        })?;
        if let Some(order_id) = response.order_id.clone() {
            log::info!("Smart list {} ordered as {}", list_id, order_id);
            self.events.emit(StoreEvent::OrderPlaced { order_id });
        }
        Ok(response.order_id)
    }

    // ------------------------------------------------------------------------
    // Optimistic quantity changes
    // ------------------------------------------------------------------------

    /// Change an item's quantity locally (never below 1) and persist the
    /// snapshot. Returns the new quantity, or `None` when nothing changed.
    pub fn apply_qty_change(&self, list_id: &EntityId, item_id: &EntityId, delta: i64) -> Option<u32> {
        let mut changed = None;
        self.lists.update(|lists| {
            let item = lists
                .iter_mut()
                .filter(|l| &l.id == list_id)
                .flat_map(|l| l.items.iter_mut())
                .find(|i| &i.id == item_id);
            if let Some(item) = item {
                let next = (item.quantity as i64 + delta).clamp(1, u32::MAX as i64) as u32;
                if next != item.quantity {
                    item.quantity = next;
                    changed = Some(next);
                }
            }
        });
        if changed.is_some() {
            self.persist_current();
        }
        changed
    }

    /// Push a quantity to the server. Failures are logged and the local
    /// value is kept.
    pub async fn sync_qty(&self, list_id: EntityId, item_id: EntityId, quantity: u32) {
        if let Err(e) = api::update_item(&self.client, &list_id, item_id.clone(), quantity).await {
            log::warn!(
                "Smart list {} item {} quantity {} not saved: {}",
                list_id,
                item_id,
                quantity,
                e
            );
        }
    }

    fn spawn_sync(&self, list_id: &EntityId, item_id: &EntityId, quantity: u32) {
        let this = self.clone();
        let list_id = list_id.clone();
        let item_id = item_id.clone();
        self.runtime.spawn(async move {
            this.sync_qty(list_id, item_id, quantity).await;
        });
    }

    pub fn increase_qty(&self, list_id: &EntityId, item_id: &EntityId) {
        if let Some(quantity) = self.apply_qty_change(list_id, item_id, 1) {
            self.spawn_sync(list_id, item_id, quantity);
        }
    }

    pub fn decrease_qty(&self, list_id: &EntityId, item_id: &EntityId) {
        if let Some(quantity) = self.apply_qty_change(list_id, item_id, -1) {
            self.spawn_sync(list_id, item_id, quantity);
        }
    }

    pub fn lists_count(&self) -> usize {
        self.lists.with(Vec::len)
    }

    /// Line items over all lists.
    pub fn items_count(&self) -> usize {
        self.lists
            .with(|lists| lists.iter().map(SmartList::item_count).sum())
    }
}

/// Hook to access the smart list store
pub fn use_smart_lists() -> SmartListStore {
    use_context::<SmartListStore>().expect("SmartListStore not found in component tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a004_product::api::{API_ROOT_PATH, PRODUCTS_FALLBACK_PATH};
    use crate::shared::events::testing::recording_sink;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::scheduler::testing;
    use crate::shared::storage::{KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct Fixture {
        store: SmartListStore,
        mock: Arc<MockTransport>,
        storage: Arc<MemoryStorage>,
        events: Arc<Mutex<Vec<StoreEvent>>>,
    }

    fn user(id: i64) -> UserProfile {
        serde_json::from_value(json!({"id": id})).unwrap()
    }

    fn fixture() -> Fixture {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(keys::ACCESS, "tok");
        let client = ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage.clone()));
        let (sink, events) = recording_sink();
        let store = SmartListStore::new(RwSignal::new(Some(user(1))), client, storage.clone(), sink);
        Fixture {
            store,
            mock,
            storage,
            events,
        }
    }

    fn weekly() -> serde_json::Value {
        json!({
            "id": 4,
            "name": "Weekly",
            "items": [
                {"id": 40, "quantity": 2, "product": {"id": 1, "name": "Flour", "price": 1.5}},
                {"id": 41, "quantity": 1, "product": 2}
            ]
        })
    }

    fn loaded() -> Fixture {
        let f = fixture();
        f.mock.on(
            Method::Get,
            api::SMART_LISTS_PATH,
            MockReply::json(200, json!({"results": [weekly()]})),
        );
        let outcome = block_on(f.store.fetch_lists(Some(&user(1))));
        assert!(outcome.success);
        f
    }

    fn quantity(store: &SmartListStore, item: &str) -> u32 {
        store.lists.with_untracked(|lists| {
            lists[0]
                .items
                .iter()
                .find(|i| i.id.as_str() == item)
                .map(|i| i.quantity)
                .unwrap()
        })
    }

    #[test]
    fn test_fetch_persists_per_user_cache() {
        let f = loaded();
        assert_eq!(f.store.lists_count(), 1);
        assert_eq!(f.store.items_count(), 2);
        assert!(f.storage.contains("smartlists_1"));
        assert!(f.store.error.get_untracked().is_none());
    }

    #[test]
    fn test_not_found_reports_feature_and_uses_cache() {
        let f = fixture();
        f.mock.on(
            Method::Get,
            api::SMART_LISTS_PATH,
            MockReply::json(200, json!([weekly()])),
        );
        f.mock.on(Method::Get, api::SMART_LISTS_PATH, MockReply::status(404));
        assert!(block_on(f.store.fetch_lists(Some(&user(1)))).success);

        let outcome = block_on(f.store.fetch_lists(Some(&user(1))));
        assert!(!outcome.success);
        assert!(outcome.is_not_found);
        assert_eq!(outcome.error.as_deref(), Some("SmartLists feature coming soon!"));
        assert_eq!(outcome.data.len(), 1);
        assert_eq!(f.store.lists_count(), 1);
        assert_eq!(
            f.store.error.get_untracked().as_deref(),
            Some("SmartLists feature coming soon!")
        );
    }

    #[test]
    fn test_timeout_without_cache_is_empty() {
        let f = fixture();
        f.mock.on(Method::Get, api::SMART_LISTS_PATH, MockReply::Timeout);
        let outcome = block_on(f.store.fetch_lists(Some(&user(1))));
        assert!(outcome.is_timeout);
        assert!(!outcome.is_not_found);
        assert!(outcome.data.is_empty());
        assert_eq!(f.store.lists_count(), 0);
    }

    #[test]
    fn test_overlapping_fetches_keep_caches_apart() {
        let f = fixture();
        let slow = json!([{"id": 1, "name": "Alice's", "items": []}]);
        let fast = json!([{"id": 2, "name": "Bob's", "items": []}]);
        f.mock.on(Method::Get, api::SMART_LISTS_PATH, MockReply::json(200, slow).delayed(3));
        f.mock.on(Method::Get, api::SMART_LISTS_PATH, MockReply::json(200, fast));

        let alice = user(1);
        let bob = user(2);
        block_on(async {
            futures::join!(
                f.store.fetch_lists(Some(&alice)),
                f.store.fetch_lists(Some(&bob))
            )
        });

        let cached = |id: &str| -> Vec<SmartList> {
            load_json(f.storage.as_ref(), &format!("smartlists_{}", id)).unwrap()
        };
        assert_eq!(cached("1")[0].name, "Alice's");
        assert_eq!(cached("2")[0].name, "Bob's");
        // Last to resolve wins in memory.
        assert_eq!(f.store.lists.get_untracked()[0].name, "Alice's");
    }

    #[test]
    fn test_decrease_never_below_one() {
        let f = loaded();
        let list = EntityId::new("4");
        let item = EntityId::new("40");

        assert_eq!(f.store.apply_qty_change(&list, &item, -1), Some(1));
        assert_eq!(f.store.apply_qty_change(&list, &item, -1), None);
        assert_eq!(quantity(&f.store, "40"), 1);
        assert_eq!(f.store.apply_qty_change(&list, &item, 1), Some(2));

        let cached: Vec<SmartList> = load_json(f.storage.as_ref(), "smartlists_1").unwrap();
        assert_eq!(cached[0].items[0].quantity, 2);
    }

    #[test]
    fn test_decrease_qty_syncs_only_real_changes() {
        let f = loaded();
        let store = f.store.clone().with_runtime(testing::install());
        let list = EntityId::new("4");
        let item = EntityId::new("40");
        let route = "/api/smartlists/4/update_item/";
        f.mock.on(Method::Post, route, MockReply::json(200, json!({})));

        store.decrease_qty(&list, &item);
        store.decrease_qty(&list, &item);
        testing::run_until_stalled();

        assert_eq!(quantity(&store, "40"), 1);
        assert_eq!(f.mock.calls(Method::Post, route), 1);
        let sent = f.mock.last_request(Method::Post, route).unwrap();
        assert_eq!(sent.body, Some(json!({"item_id": 40, "quantity": 1})));

        store.increase_qty(&list, &item);
        testing::run_until_stalled();
        assert_eq!(quantity(&store, "40"), 2);
        assert_eq!(f.mock.calls(Method::Post, route), 2);
    }

    #[test]
    fn test_failed_sync_keeps_local_quantity() {
        let f = loaded();
        let list = EntityId::new("4");
        let item = EntityId::new("41");
        f.mock.on(Method::Post, "/api/smartlists/4/update_item/", MockReply::status(500));

        let q = f.store.apply_qty_change(&list, &item, 1).unwrap();
        block_on(f.store.sync_qty(list, item, q));

        assert_eq!(quantity(&f.store, "41"), 2);
        let sent = f
            .mock
            .last_request(Method::Post, "/api/smartlists/4/update_item/")
            .unwrap();
        assert_eq!(sent.body, Some(json!({"item_id": 41, "quantity": 2})));
    }

    #[test]
    fn test_catalog_fills_placeholder_items() {
        let f = loaded();
        let placeholder = f.store.lists.with_untracked(|l| l[0].items[1].product.clone());
        assert!(placeholder.is_placeholder());

        f.mock.on(Method::Get, API_ROOT_PATH, MockReply::json(200, json!({})));
        f.mock.on(
            Method::Get,
            PRODUCTS_FALLBACK_PATH,
            MockReply::json(200, json!([{"id": 2, "name": "Sugar", "price": 2}])),
        );
        block_on(f.store.fetch_catalog()).unwrap();
        block_on(f.store.fetch_catalog()).unwrap();

        assert_eq!(f.mock.calls(Method::Get, PRODUCTS_FALLBACK_PATH), 1);
        let product = f.store.lists.with_untracked(|l| l[0].items[1].product.clone());
        assert_eq!(product.name, "Sugar");
    }

    #[test]
    fn test_mutations_gate_missing_feature() {
        let f = fixture();
        f.mock.on(Method::Post, api::SMART_LISTS_PATH, MockReply::status(404));
        let err = block_on(f.store.create_list("Party")).unwrap_err();
        assert_eq!(err, ApiError::FeatureUnavailable("SmartLists"));
        assert_eq!(err.to_string(), "SmartLists feature coming soon!");
    }

    #[test]
    fn test_create_and_delete_list() {
        let f = fixture();
        f.mock.on(
            Method::Post,
            api::SMART_LISTS_PATH,
            MockReply::json(201, json!({"id": 9, "name": "Party"})),
        );
        f.mock.on(Method::Delete, "/api/smartlists/9/", MockReply::status(204));

        let list = block_on(f.store.create_list("Party")).unwrap();
        assert_eq!(list.id.as_str(), "9");
        assert_eq!(f.store.lists_count(), 1);

        block_on(f.store.delete_list(&list.id)).unwrap();
        assert_eq!(f.store.lists_count(), 0);
        assert_eq!(f.storage.get_item("smartlists_1").as_deref(), Some("[]"));
    }

    #[test]
    fn test_order_all_emits_order_placed() {
        let f = loaded();
        f.mock.on(
            Method::Post,
            "/api/smartlists/4/order_all/",
            MockReply::json(200, json!({"order_id": "A-17"})),
        );
        let id = block_on(f.store.order_all(&EntityId::new("4"))).unwrap();
        assert_eq!(id, Some(EntityId::new("A-17")));
        assert_eq!(
            *f.events.lock().unwrap(),
            vec![StoreEvent::OrderPlaced {
                order_id: EntityId::new("A-17")
            }]
        );
    }

    #[test]
    fn test_remove_item_updates_locally() {
        let f = loaded();
        f.mock.on(
            Method::Post,
            "/api/smartlists/4/remove_item/",
            MockReply::json(200, json!({})),
        );
        block_on(f.store.remove_item(&EntityId::new("4"), &EntityId::new("40"))).unwrap();
        assert_eq!(f.store.items_count(), 1);
    }

    #[test]
    fn test_no_user_clears_without_request() {
        let f = fixture();
        let outcome = block_on(f.store.fetch_lists(None));
        assert!(outcome.success);
        assert_eq!(f.mock.total_calls(), 0);
    }
}
