use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::envelope::{ListPayload, ShapeRules};
use crate::shared::ids::EntityId;
use crate::shared::lenient;

/// Server-issued notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Order,
    CartReminder,
    Promotion,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Order => "order",
            NotificationKind::CartReminder => "cart_reminder",
            NotificationKind::Promotion => "promotion",
            NotificationKind::System => "system",
        }
    }

    /// Unknown types are shown as system notices.
    pub fn from_str(s: &str) -> Self {
        match s {
            "order" | "order_placed" | "order_status" => NotificationKind::Order,
            "cart_reminder" | "cart" => NotificationKind::CartReminder,
            "promotion" | "promo" => NotificationKind::Promotion,
            _ => NotificationKind::System,
        }
    }
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        self.kind
            .as_deref()
            .map(NotificationKind::from_str)
            .unwrap_or(NotificationKind::System)
    }

    /// Client-side notification that never reached the server.
    pub fn local(
        id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: Option<String>,
    ) -> Self {
        Self {
            id: EntityId::new(id),
            kind: Some(kind.as_str().to_string()),
            title: Some(title.into()),
            message: Some(message.into()),
            is_read: false,
            created_at,
            order_id: None,
        }
    }
}

/// `[...]`, `{results}` or one bare notification object.
pub const NOTIFICATION_RULES: ShapeRules = ShapeRules {
    keys: &["results", "notifications"],
    nested: &[],
    single_object: true,
};

pub fn normalize_notifications(payload: &Value) -> Vec<Notification> {
    ListPayload::detect(payload, &NOTIFICATION_RULES)
        .into_rows()
        .into_iter()
        .filter_map(|row| serde_json::from_value::<Notification>(row).ok())
        .collect()
}

pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|n| !n.is_read).count()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub is_read: bool,
}
