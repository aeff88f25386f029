use contracts::domain::a005_notification::MarkReadRequest;
use contracts::shared::ids::EntityId;
use serde_json::Value;

use crate::shared::api_utils::segment;
use crate::shared::http::{ApiClient, ApiError};

pub const NOTIFICATIONS_PATH: &str = "/api/notifications/";

pub fn notification_path(id: &EntityId) -> String {
    format!("{}{}/", NOTIFICATIONS_PATH, segment(id.as_str()))
}

pub async fn fetch_notifications(client: &ApiClient) -> Result<Value, ApiError> {
    client.get_value(NOTIFICATIONS_PATH).await
}

pub async fn mark_read(client: &ApiClient, id: &EntityId) -> Result<(), ApiError> {
    client
        .patch(&notification_path(id), &MarkReadRequest { is_read: true })
        .await
        .map(|_| ())
}
