pub mod aggregate;

pub use aggregate::{
    normalize_notifications, unread_count, MarkReadRequest, Notification, NotificationKind,
    NOTIFICATION_RULES,
};
