use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::envelope::{ListPayload, ShapeRules};
use crate::shared::ids::EntityId;
use crate::shared::lenient::{value_as_f64, value_as_string};

// ============================================================================
// Normalized product
// ============================================================================

/// Product as the client works with it.
///
/// The catalog, cart rows and smart list rows all carry product data in
/// slightly different shapes; everything is funnelled through
/// [`normalize_product`] into this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Product {
    /// Stand-in for a row that references a product the catalog does not know.
    pub fn placeholder(id: EntityId) -> Self {
        Self {
            id,
            name: UNKNOWN_PRODUCT.to_string(),
            price: 0.0,
            image: String::new(),
            category: String::new(),
            slug: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == UNKNOWN_PRODUCT && self.price == 0.0
    }
}

pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Wrappers the product list endpoint is known to use.
pub const PRODUCT_LIST_RULES: ShapeRules =
    ShapeRules::keyed(&["results", "items", "data", "products"]);

// ============================================================================
// Normalization
// ============================================================================

fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(value_as_string)
}

/// Image field: plain URL, `{url}`/`{image}`/`{src}` object, or the first
/// entry of an `images` array in either form.
fn image_of(obj: &Value) -> String {
    fn from_field(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(_) => first_string(value, &["url", "image", "src"]),
            _ => None,
        }
    }

    ["image", "image_url", "thumbnail"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(from_field)
        .or_else(|| {
            obj.get("images")
                .and_then(Value::as_array)
                .and_then(|images| images.iter().find_map(from_field))
        })
        .unwrap_or_default()
}

/// Category field: plain name or `{name}`/`{title}` object.
fn category_of(obj: &Value) -> String {
    let category = match obj.get("category") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(c @ Value::Object(_)) => first_string(c, &["name", "title", "slug"]),
        _ => None,
    };
    category
        .or_else(|| first_string(obj, &["category_name"]))
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Map any product-like JSON object to a [`Product`].
///
/// Returns `None` only for non-objects.
pub fn normalize_product(value: &Value) -> Option<Product> {
    if !value.is_object() {
        return None;
    }

    let id = value
        .get("id")
        .and_then(EntityId::from_value)
        .or_else(|| value.get("product_id").and_then(EntityId::from_value))
        .unwrap_or_default();

    let price = ["price", "unit_price", "sale_price"]
        .iter()
        .filter_map(|k| value.get(*k))
        .find_map(value_as_f64)
        .unwrap_or(0.0);

    Some(Product {
        id,
        name: first_string(value, &["name", "title", "product_name"])
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        price,
        image: image_of(value),
        category: category_of(value),
        slug: first_string(value, &["slug"]),
    })
}

/// Normalize a product list payload in any supported shape.
pub fn normalize_products(payload: &Value) -> Vec<Product> {
    ListPayload::detect(payload, &PRODUCT_LIST_RULES)
        .into_rows()
        .iter()
        .filter_map(normalize_product)
        .collect()
}
