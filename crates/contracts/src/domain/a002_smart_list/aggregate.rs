use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::a004_product::aggregate::{normalize_product, Product};
use crate::shared::envelope::{ListPayload, ShapeRules};
use crate::shared::ids::EntityId;
use crate::shared::lenient::{value_as_string, value_as_u32};

/// Named, reusable reorder list owned by a user. Independent of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartList {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub items: Vec<SmartListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartListItem {
    pub id: EntityId,
    /// Always at least 1.
    pub quantity: u32,
    pub product: Product,
}

impl SmartList {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn units(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn estimated_total(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.product.price * i.quantity as f64)
            .sum()
    }
}

pub const SMART_LIST_RULES: ShapeRules = ShapeRules::keyed(&["results", "smartlists", "lists"]);

fn find_in_catalog<'a>(catalog: &'a [Product], id: &EntityId) -> Option<&'a Product> {
    catalog.iter().find(|p| &p.id == id)
}

/// Normalize one list item. The product is either embedded as an object or
/// referenced by id, in which case it is looked up in `catalog`.
fn normalize_item(row: &Value, catalog: &[Product]) -> Option<SmartListItem> {
    if !row.is_object() {
        return None;
    }

    let product = match row.get("product") {
        Some(obj @ Value::Object(_)) => normalize_product(obj),
        _ => None,
    }
    .or_else(|| {
        let id = row
            .get("product")
            .and_then(EntityId::from_value)
            .or_else(|| row.get("product_id").and_then(EntityId::from_value))?;
        Some(
            find_in_catalog(catalog, &id)
                .cloned()
                .unwrap_or_else(|| Product::placeholder(id)),
        )
    })?;

    Some(SmartListItem {
        id: row.get("id").and_then(EntityId::from_value).unwrap_or_default(),
        quantity: row
            .get("quantity")
            .and_then(value_as_u32)
            .unwrap_or(1)
            .max(1),
        product,
    })
}

pub fn normalize_smart_list(value: &Value, catalog: &[Product]) -> Option<SmartList> {
    let id = value.get("id").and_then(EntityId::from_value)?;
    let items = value
        .get("items")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|r| normalize_item(r, catalog)).collect())
        .unwrap_or_default();

    Some(SmartList {
        id,
        name: value
            .get("name")
            .and_then(value_as_string)
            .unwrap_or_default(),
        created_at: value.get("created_at").and_then(value_as_string),
        updated_at: value.get("updated_at").and_then(value_as_string),
        items,
    })
}

pub fn normalize_smart_lists(payload: &Value, catalog: &[Product]) -> Vec<SmartList> {
    ListPayload::detect(payload, &SMART_LIST_RULES)
        .into_rows()
        .iter()
        .filter_map(|row| normalize_smart_list(row, catalog))
        .collect()
}

/// Replace placeholder products with catalog entries once the catalog is
/// available. Returns how many items were filled in.
pub fn enrich_from_catalog(lists: &mut [SmartList], catalog: &[Product]) -> usize {
    let mut filled = 0;
    for item in lists.iter_mut().flat_map(|l| l.items.iter_mut()) {
        if !item.product.is_placeholder() {
            continue;
        }
        if let Some(product) = find_in_catalog(catalog, &item.product.id) {
            item.product = product.clone();
            filled += 1;
        }
    }
    filled
}
