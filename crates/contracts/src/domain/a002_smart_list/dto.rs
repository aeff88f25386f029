use serde::{Deserialize, Serialize};

use crate::shared::ids::EntityId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSmartListRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSmartListItemRequest {
    pub product_id: EntityId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveSmartListItemRequest {
    pub item_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSmartListItemRequest {
    pub item_id: EntityId,
    pub quantity: u32,
}
