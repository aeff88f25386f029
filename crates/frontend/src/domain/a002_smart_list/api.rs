use contracts::domain::a001_cart::CheckoutResponse;
use contracts::domain::a002_smart_list::{
    AddSmartListItemRequest, CreateSmartListRequest, RemoveSmartListItemRequest,
    UpdateSmartListItemRequest,
};
use contracts::shared::ids::EntityId;
use serde_json::{json, Value};

use crate::shared::api_utils::segment;
use crate::shared::http::{ApiClient, ApiError};

pub const SMART_LISTS_PATH: &str = "/api/smartlists/";

/// `/api/smartlists/{id}/` or `/api/smartlists/{id}/{action}/`.
pub fn list_path(list_id: &EntityId, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("{}{}/{}/", SMART_LISTS_PATH, segment(list_id.as_str()), action),
        None => format!("{}{}/", SMART_LISTS_PATH, segment(list_id.as_str())),
    }
}

pub async fn fetch_lists(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_value(SMART_LISTS_PATH).await
}

/// Returns the created list as sent back by the server.
pub async fn create_list(client: &ApiClient, name: &str) -> Result<Value, ApiError> {
    let request = CreateSmartListRequest {
        name: name.to_string(),
    };
    client.post(SMART_LISTS_PATH, &request).await
}

pub async fn delete_list(client: &ApiClient, list_id: &EntityId) -> Result<(), ApiError> {
    client.delete(&list_path(list_id, None)).await
}

pub async fn add_item(
    client: &ApiClient,
    list_id: &EntityId,
    product_id: EntityId,
    quantity: u32,
) -> Result<(), ApiError> {
    let request = AddSmartListItemRequest {
        product_id,
        quantity,
    };
    client
        .post(&list_path(list_id, Some("add_item")), &request)
        .await
        .map(|_| ())
}

pub async fn remove_item(
    client: &ApiClient,
    list_id: &EntityId,
    item_id: EntityId,
) -> Result<(), ApiError> {
    let request = RemoveSmartListItemRequest { item_id };
    client
        .post(&list_path(list_id, Some("remove_item")), &request)
        .await
        .map(|_| ())
}

pub async fn update_item(
    client: &ApiClient,
    list_id: &EntityId,
    item_id: EntityId,
    quantity: u32,
) -> Result<(), ApiError> {
    let request = UpdateSmartListItemRequest { item_id, quantity };
    client
        .post(&list_path(list_id, Some("update_item")), &request)
        .await
        .map(|_| ())
}

/// Put every item of the list into one order.
pub async fn order_all(client: &ApiClient, list_id: &EntityId) -> Result<CheckoutResponse, ApiError> {
    let raw = client
        .post(&list_path(list_id, Some("order_all")), &json!({}))
        .await?;
    Ok(CheckoutResponse::from_value(raw))
}
