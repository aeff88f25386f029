use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::ids::EntityId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    /// Product id or slug.
    pub product: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub item_id: EntityId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCartItemRequest {
    pub item_id: EntityId,
}

/// Checkout answer. Only the order id matters to the client; it may sit at
/// `order_id`, `order.id` or `id` depending on the API version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutResponse {
    pub order_id: Option<EntityId>,
    pub raw: Value,
}

impl CheckoutResponse {
    pub fn from_value(raw: Value) -> Self {
        let order_id = raw
            .get("order_id")
            .and_then(EntityId::from_value)
            .or_else(|| {
                raw.get("order")
                    .and_then(|o| o.get("id"))
                    .and_then(EntityId::from_value)
            })
            .or_else(|| raw.get("id").and_then(EntityId::from_value));
        Self { order_id, raw }
    }
}
