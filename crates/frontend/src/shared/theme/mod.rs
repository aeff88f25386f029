//! Theme management.
//!
//! The preference is cached per user (`theme-<id>`, `theme-guest` before
//! sign-in) so the right palette is applied before the backend answers, and
//! synced to the profile when a session exists.

pub mod theme_toggle;

use contracts::enums::theme::Theme;
use contracts::system::auth::UserProfile;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::shared::http::ApiClient;
use crate::shared::storage::{keys, SharedStorage};
use crate::system::auth::api;

/// Reflect the theme on the document (`data-theme` on `<html>` and `<body>`).
fn apply_theme(theme: Theme) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(root) = document.document_element() {
            let _ = root.set_attribute("data-theme", theme.as_str());
        }
        if let Some(body) = document.body() {
            let _ = body.set_attribute("data-theme", theme.as_str());
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = theme;
}

#[derive(Clone)]
pub struct ThemeStore {
    pub theme: RwSignal<Theme>,
    user: RwSignal<Option<UserProfile>>,
    client: ApiClient,
    storage: SharedStorage,
}

impl ThemeStore {
    pub fn new(user: RwSignal<Option<UserProfile>>, client: ApiClient, storage: SharedStorage) -> Self {
        Self {
            theme: RwSignal::new(Theme::default()),
            user,
            client,
            storage,
        }
    }

    fn storage_key(&self) -> String {
        self.user
            .with_untracked(|u| keys::theme(u.as_ref().map(|u| &u.id)))
    }

    fn set_local(&self, key: &str, theme: Theme) {
        self.theme.set(theme);
        self.storage.set_item(key, theme.as_str());
        apply_theme(theme);
    }

    /// Apply the cached preference for `user` right away, then take the
    /// backend value when a session exists.
    pub async fn resolve(&self, user: Option<&UserProfile>) {
        let key = keys::theme(user.map(|u| &u.id));
        let cached = self
            .storage
            .get_item(&key)
            .and_then(|v| Theme::parse(&v))
            .or_else(|| user.and_then(|u| u.theme.as_deref()).and_then(Theme::parse))
            .unwrap_or_default();
        self.theme.set(cached);
        apply_theme(cached);

        if !self.client.tokens().has_session() {
            return;
        }
        match api::fetch_theme(&self.client).await {
            Ok(Some(theme)) => self.set_local(&key, theme),
            Ok(None) => log::debug!("backend theme not recognised, keeping {}", cached.as_str()),
            Err(e) => log::warn!("Failed to fetch theme: {}", e),
        }
    }

    /// Flip and persist locally. Returns the new theme.
    pub fn toggle_local(&self) -> Theme {
        let next = self.theme.get_untracked().toggled();
        self.set_local(&self.storage_key(), next);
        next
    }

    /// Save the theme to the profile. Failures are only logged.
    pub async fn push_theme(&self, theme: Theme) {
        if !self.client.tokens().has_session() {
            return;
        }
        if let Err(e) = api::save_theme(&self.client, theme).await {
            log::warn!("Failed to save theme {}: {}", theme.as_str(), e);
        }
    }

    pub fn toggle_theme(&self) {
        let next = self.toggle_local();
        let this = self.clone();
        spawn_local(async move { this.push_theme(next).await });
    }
}

/// Hook to access the theme store
pub fn use_theme() -> ThemeStore {
    use_context::<ThemeStore>().expect("ThemeStore not found in component tree")
}
