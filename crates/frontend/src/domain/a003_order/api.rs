use contracts::domain::a001_cart::CheckoutResponse;
use contracts::domain::a003_order::{Order, PlaceOrderRequest};
use serde_json::{Map, Value};

use crate::domain::a001_cart::api::CHECKOUT_PATH;
use crate::shared::http::{ApiClient, ApiError};

pub const USER_ORDERS_PATH: &str = "/api/orders/";

pub async fn fetch_orders(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_value(USER_ORDERS_PATH).await
}

/// Order record out of a checkout answer: `{order: {...}}`, the order itself,
/// or at least `{order_id}`.
fn order_from_response(raw: Value) -> Option<Order> {
    let embedded = raw
        .get("order")
        .filter(|o| o.is_object())
        .cloned()
        .and_then(|o| serde_json::from_value::<Order>(o).ok())
        .filter(|o| !o.id.is_empty());
    if embedded.is_some() {
        return embedded;
    }
    let bare = serde_json::from_value::<Order>(raw.clone())
        .ok()
        .filter(|o| !o.id.is_empty());
    if bare.is_some() {
        return bare;
    }
    CheckoutResponse::from_value(raw).order_id.map(|id| Order {
        id,
        fields: Map::new(),
    })
}

pub async fn place_order(client: &ApiClient, request: &PlaceOrderRequest) -> Result<Order, ApiError> {
    let raw = client.post(CHECKOUT_PATH, request).await?;
    order_from_response(raw).ok_or_else(|| ApiError::Decode("checkout response has no order id".into()))
}
