use crate::shared::storage::{keys, SharedStorage};

/// Access/refresh tokens in durable storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: SharedStorage,
}

impl TokenStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Get access token
    pub fn access_token(&self) -> Option<String> {
        self.storage
            .get_item(keys::ACCESS)
            .filter(|t| !t.is_empty())
    }

    /// Get refresh token
    pub fn refresh_token(&self) -> Option<String> {
        self.storage
            .get_item(keys::REFRESH)
            .filter(|t| !t.is_empty())
    }

    /// Save a freshly issued pair. `refresh` is `None` when the backend did
    /// not rotate it, in which case the old one is kept.
    pub fn save_tokens(&self, access: &str, refresh: Option<&str>) {
        self.storage.set_item(keys::ACCESS, access);
        if let Some(refresh) = refresh {
            self.storage.set_item(keys::REFRESH, refresh);
        }
    }

    pub fn has_session(&self) -> bool {
        self.access_token().is_some() || self.refresh_token().is_some()
    }

    /// Clear all authentication tokens
    pub fn clear(&self) {
        self.storage.remove_item(keys::ACCESS);
        self.storage.remove_item(keys::REFRESH);
    }
}
