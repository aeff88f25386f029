use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::a001_cart::aggregate::CartItem;
use crate::shared::envelope::{ListPayload, ShapeRules};
use crate::shared::ids::EntityId;
use crate::shared::lenient::{value_as_f64, value_as_string};

/// Order record. Apart from the id the client treats it as opaque and keeps
/// every server field for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Order {
    pub fn status(&self) -> Option<String> {
        self.fields.get("status").and_then(value_as_string)
    }

    pub fn total(&self) -> Option<f64> {
        ["total", "total_amount", "total_price"]
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find_map(value_as_f64)
    }

    pub fn created_at(&self) -> Option<String> {
        self.fields.get("created_at").and_then(value_as_string)
    }
}

pub const ORDER_RULES: ShapeRules = ShapeRules::keyed(&["results", "orders"]);

pub fn normalize_orders(payload: &Value) -> Vec<Order> {
    ListPayload::detect(payload, &ORDER_RULES)
        .into_rows()
        .into_iter()
        .filter_map(|row| serde_json::from_value::<Order>(row).ok())
        .filter(|o| !o.id.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderLine {
    pub product_id: EntityId,
    pub quantity: u32,
    pub price: f64,
}

/// Checkout payload built from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<PlaceOrderLine>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlaceOrderRequest {
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self {
            items: items
                .iter()
                .map(|i| PlaceOrderLine {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    price: i.price,
                })
                .collect(),
            total: crate::domain::a001_cart::aggregate::cart_total(items),
            address_id: None,
            notes: None,
        }
    }
}
