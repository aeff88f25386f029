//! Durable key/value storage.
//!
//! Stores never touch `localStorage` directly; they go through
//! [`KeyValueStorage`] so the same code runs against [`MemoryStorage`] in
//! tests and when the browser refuses storage access (private mode).

use contracts::shared::ids::EntityId;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Storage keys. Per-user collections are namespaced by user id so that
/// switching accounts never shows another customer's data.
pub mod keys {
    use super::EntityId;

    pub const ACCESS: &str = "access";
    pub const REFRESH: &str = "refresh";
    pub const AUTH_USER: &str = "auth_user";
    pub const REMEMBERED_BUSINESS_NAME: &str = "remembered_business_name";
    pub const REMEMBER_BUSINESS_NAME: &str = "remember_business_name";
    pub const THEME_GUEST: &str = "theme-guest";

    pub fn cart(user_id: &EntityId) -> String {
        format!("cart_{}", user_id)
    }

    pub fn orders(user_id: &EntityId) -> String {
        format!("orders_{}", user_id)
    }

    pub fn smart_lists(user_id: &EntityId) -> String {
        format!("smartlists_{}", user_id)
    }

    pub fn cart_reminder(user_id: &EntityId) -> String {
        format!("cart_reminder_{}", user_id)
    }

    pub fn theme(user_id: Option<&EntityId>) -> String {
        match user_id {
            Some(id) => format!("theme-{}", id),
            None => THEME_GUEST.to_string(),
        }
    }
}

/// Read and decode a JSON snapshot. Corrupt entries read as missing.
pub fn load_json<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding unreadable cache entry '{}': {}", key, e);
            None
        }
    }
}

/// Encode and write a JSON snapshot.
pub fn save_json<T: Serialize + ?Sized>(storage: &dyn KeyValueStorage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set_item(key, &raw),
        Err(e) => log::warn!("Failed to serialize cache entry '{}': {}", key, e),
    }
}

// ============================================================================
// Browser localStorage
// ============================================================================

/// `window.localStorage`. Write failures (quota, disabled storage) are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    /// Whether the browser grants storage access at all.
    pub fn is_available() -> bool {
        Self::local_storage().is_some()
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::local_storage()?.get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = Self::local_storage() {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Storage for the running app: `localStorage` when the browser allows it,
/// otherwise an in-memory map that lives as long as the page.
pub fn app_storage() -> SharedStorage {
    #[cfg(target_arch = "wasm32")]
    {
        if BrowserStorage::is_available() {
            return Arc::new(BrowserStorage);
        }
        log::warn!("localStorage unavailable, falling back to in-memory storage");
    }
    Arc::new(MemoryStorage::new())
}
