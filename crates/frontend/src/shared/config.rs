//! Runtime configuration of the storefront client.

use crate::shared::api_utils::api_base;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// API origin, without trailing slash.
    pub api_origin: String,
    /// Requests not answered within this window fail with a timeout.
    pub request_timeout_ms: u32,
    /// Notification polling period while a user is signed in.
    pub notification_poll_ms: u32,
    /// Inactivity after which the session is ended.
    pub idle_timeout_ms: u64,
    /// How often the inactivity watchdog checks.
    pub idle_check_ms: u32,
    /// Cart size (in units) from which the cart reminder may fire.
    pub cart_reminder_threshold: u32,
    /// Minimum time between two cart reminders for one user.
    pub cart_reminder_cooldown_ms: u64,
    /// How long a toast stays on screen.
    pub toast_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_origin: crate::shared::api_utils::LOCAL_API_ORIGIN.to_string(),
            request_timeout_ms: 15_000,
            notification_poll_ms: 60_000,
            idle_timeout_ms: 30 * 60 * 1000,
            idle_check_ms: 30_000,
            cart_reminder_threshold: 2,
            cart_reminder_cooldown_ms: 60 * 60 * 1000,
            toast_ms: 3_500,
        }
    }
}

impl AppConfig {
    /// Defaults with the API origin resolved from the page location.
    pub fn from_location() -> Self {
        Self {
            api_origin: api_base(),
            ..Self::default()
        }
    }
}
