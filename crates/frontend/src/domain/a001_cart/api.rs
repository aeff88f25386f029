use contracts::domain::a001_cart::{
    AddToCartRequest, CheckoutResponse, RemoveCartItemRequest, UpdateCartItemRequest,
};
use contracts::shared::ids::EntityId;
use serde_json::{json, Value};

use crate::shared::http::{ApiClient, ApiError};

pub const CART_PATH: &str = "/api/cart/";
pub const CART_ADD_PATH: &str = "/api/cart/add/";
pub const CART_UPDATE_PATH: &str = "/api/cart/update/";
pub const CART_REMOVE_PATH: &str = "/api/cart/remove/";
pub const CART_CLEAR_PATH: &str = "/api/cart/clear/";
pub const CHECKOUT_PATH: &str = "/api/checkout/";

/// Raw cart payload; shape varies between API versions.
pub async fn fetch_cart(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_value(CART_PATH).await
}

pub async fn add_item(client: &ApiClient, product: &str, quantity: u32) -> Result<(), ApiError> {
    let request = AddToCartRequest {
        product: product.to_string(),
        quantity,
    };
    client.post(CART_ADD_PATH, &request).await.map(|_| ())
}

pub async fn update_item(
    client: &ApiClient,
    item_id: EntityId,
    quantity: u32,
) -> Result<(), ApiError> {
    let request = UpdateCartItemRequest { item_id, quantity };
    client.post(CART_UPDATE_PATH, &request).await.map(|_| ())
}

pub async fn remove_item(client: &ApiClient, item_id: EntityId) -> Result<(), ApiError> {
    let request = RemoveCartItemRequest { item_id };
    client.post(CART_REMOVE_PATH, &request).await.map(|_| ())
}

pub async fn clear(client: &ApiClient) -> Result<(), ApiError> {
    client.post(CART_CLEAR_PATH, &json!({})).await.map(|_| ())
}

/// Turn the server-side cart into an order.
pub async fn checkout(client: &ApiClient) -> Result<CheckoutResponse, ApiError> {
    let raw = client.post(CHECKOUT_PATH, &json!({})).await?;
    Ok(CheckoutResponse::from_value(raw))
}
