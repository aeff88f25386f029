use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::a004_product::aggregate::{normalize_product, UNKNOWN_PRODUCT};
use crate::shared::envelope::{ListPayload, ShapeRules};
use crate::shared::ids::EntityId;
use crate::shared::lenient::{value_as_f64, value_as_string, value_as_u32};

/// One line of the current user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart row id, used for update/remove.
    pub id: EntityId,
    pub product_id: EntityId,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    pub image: String,
    pub price: f64,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// Whether `identifier` names this line: row id, product id or slug.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id.as_str() == identifier
            || self.product_id.as_str() == identifier
            || self.slug.as_deref() == Some(identifier)
    }
}

/// `[...]`, `{items}`, `{results}`, `{cart: {items}}`.
pub const CART_RULES: ShapeRules = ShapeRules {
    keys: &["items", "results"],
    nested: &[("cart", "items")],
    single_object: false,
};

fn row_string(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find_map(value_as_string)
}

/// Normalize one cart row.
///
/// Product data is read from the embedded `product` (or `product_details`)
/// object when there is one; any field it lacks falls back to the row itself.
pub fn normalize_cart_item(row: &Value) -> Option<CartItem> {
    if !row.is_object() {
        return None;
    }

    let linked = ["product", "product_details"]
        .iter()
        .filter_map(|k| row.get(*k))
        .find(|v| v.is_object())
        .and_then(normalize_product);

    let product_id = linked
        .as_ref()
        .map(|p| p.id.clone())
        .filter(|id| !id.is_empty())
        .or_else(|| row.get("product").and_then(EntityId::from_value))
        .or_else(|| row.get("product_id").and_then(EntityId::from_value))
        .unwrap_or_default();

    let name = linked
        .as_ref()
        .map(|p| p.name.clone())
        .filter(|n| n != UNKNOWN_PRODUCT)
        .or_else(|| row_string(row, &["name", "product_name", "title"]))
        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());

    let image = linked
        .as_ref()
        .map(|p| p.image.clone())
        .filter(|i| !i.is_empty())
        .or_else(|| row_string(row, &["image", "image_url"]))
        .unwrap_or_default();

    let price = linked
        .as_ref()
        .map(|p| p.price)
        .filter(|p| *p > 0.0)
        .or_else(|| {
            ["price", "unit_price"]
                .iter()
                .filter_map(|k| row.get(*k))
                .find_map(value_as_f64)
        })
        .unwrap_or(0.0);

    let slug = linked
        .as_ref()
        .and_then(|p| p.slug.clone())
        .or_else(|| row_string(row, &["slug"]));

    let quantity = row
        .get("quantity")
        .and_then(value_as_u32)
        .unwrap_or(1)
        .max(1);

    Some(CartItem {
        id: row.get("id").and_then(EntityId::from_value).unwrap_or_default(),
        product_id,
        slug,
        name,
        image,
        price,
        quantity,
    })
}

/// Normalize a cart payload in any supported shape.
pub fn normalize_cart(payload: &Value) -> Vec<CartItem> {
    ListPayload::detect(payload, &CART_RULES)
        .into_rows()
        .iter()
        .filter_map(normalize_cart_item)
        .collect()
}

/// Total number of units in the cart.
pub fn cart_count(items: &[CartItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}

/// Cart value, sum of price × quantity.
pub fn cart_total(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}
