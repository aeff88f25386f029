use contracts::system::auth::{SignupRequest, UserProfile};
use leptos::prelude::*;

use super::api;
use crate::shared::http::{ApiClient, ApiError};
use crate::shared::storage::{keys, save_json, SharedStorage};

/// Current customer identity.
///
/// Starts in `loading` until the first [`AuthStore::fetch_user`] resolves
/// (or finds no token), then holds either a user or `None` (anonymous).
#[derive(Clone)]
pub struct AuthStore {
    pub user: RwSignal<Option<UserProfile>>,
    pub loading: RwSignal<bool>,
    client: ApiClient,
    storage: SharedStorage,
}

impl AuthStore {
    pub fn new(client: ApiClient, storage: SharedStorage) -> Self {
        Self {
            user: RwSignal::new(None),
            loading: RwSignal::new(true),
            client,
            storage,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.with(Option::is_some)
    }

    fn set_user(&self, user: UserProfile) {
        save_json(self.storage.as_ref(), keys::AUTH_USER, &user);
        self.user.set(Some(user));
    }

    /// Resolve the user from the stored token. Never fails: any error leaves
    /// the app anonymous.
    pub async fn fetch_user(&self) {
        if !self.client.tokens().has_session() {
            self.user.set(None);
            self.loading.set(false);
            return;
        }
        match api::fetch_profile(&self.client).await {
            Ok(user) => {
                log::info!("Signed in as user {}", user.id);
                self.set_user(user);
            }
            Err(e) => {
                log::warn!("Failed to fetch profile: {}", e);
                self.user.set(None);
            }
        }
        self.loading.set(false);
    }

    /// Same as [`fetch_user`](Self::fetch_user) but reports the failure, for
    /// flows (login) that must react to it.
    pub async fn refresh_user(&self) -> Result<UserProfile, ApiError> {
        let result = api::fetch_profile(&self.client).await;
        match &result {
            Ok(user) => self.set_user(user.clone()),
            Err(e) => {
                log::error!("Failed to refresh profile: {}", e);
                self.user.set(None);
            }
        }
        self.loading.set(false);
        result
    }

    /// Obtain tokens, then load the profile.
    pub async fn login(
        &self,
        business_name: String,
        password: String,
        remember: bool,
    ) -> Result<UserProfile, ApiError> {
        let tokens = api::login(&self.client, business_name.clone(), password)
            .await
            .map_err(|e| {
                log::error!("Login failed: {}", e);
                e
            })?;
        self.client
            .tokens()
            .save_tokens(&tokens.access, Some(&tokens.refresh));
        self.remember_business_name(remember.then_some(business_name.as_str()));
        self.refresh_user().await
    }

    /// Create the account, then sign in with the same credentials.
    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, ApiError> {
        api::signup(&self.client, &request).await.map_err(|e| {
            log::error!("Signup failed: {}", e);
            e
        })?;
        self.login(request.business_name, request.password, false)
            .await
    }

    /// Clear tokens, the cached user and the user's theme preference.
    pub fn logout(&self) {
        let user_id = self.user.with_untracked(|u| u.as_ref().map(|u| u.id.clone()));
        self.client.tokens().clear();
        self.storage.remove_item(keys::AUTH_USER);
        self.storage.remove_item(&keys::theme(user_id.as_ref()));
        self.storage.remove_item(keys::THEME_GUEST);
        self.user.set(None);
        self.loading.set(false);
        log::info!("Signed out");
    }

    fn remember_business_name(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.storage.set_item(keys::REMEMBERED_BUSINESS_NAME, name);
                self.storage.set_item(keys::REMEMBER_BUSINESS_NAME, "true");
            }
            None => {
                self.storage.remove_item(keys::REMEMBERED_BUSINESS_NAME);
                self.storage.remove_item(keys::REMEMBER_BUSINESS_NAME);
            }
        }
    }

    /// Business name to pre-fill on the login form.
    pub fn remembered_business_name(&self) -> Option<String> {
        if self.storage.get_item(keys::REMEMBER_BUSINESS_NAME).as_deref() != Some("true") {
            return None;
        }
        self.storage.get_item(keys::REMEMBERED_BUSINESS_NAME)
    }
}

/// Hook to access the auth store
pub fn use_auth() -> AuthStore {
    use_context::<AuthStore>().expect("AuthStore not found in component tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::{KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (AuthStore, Arc<MockTransport>, Arc<MemoryStorage>) {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        let client = ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage.clone()));
        (AuthStore::new(client, storage.clone()), mock, storage)
    }

    #[test]
    fn test_fetch_user_without_token_skips_network() {
        let (auth, mock, _) = setup();
        assert!(auth.loading.get_untracked());
        block_on(auth.fetch_user());
        assert!(!auth.loading.get_untracked());
        assert!(auth.user.get_untracked().is_none());
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_fetch_user_failure_is_anonymous_not_error() {
        let (auth, mock, storage) = setup();
        storage.set_item(keys::ACCESS, "tok");
        mock.on(Method::Get, api::PROFILE_PATH, MockReply::status(500));
        block_on(auth.fetch_user());
        assert!(auth.user.get_untracked().is_none());
        assert!(!auth.loading.get_untracked());

        assert!(block_on(auth.refresh_user()).is_err());
    }

    #[test]
    fn test_login_stores_tokens_and_user() {
        let (auth, mock, storage) = setup();
        mock.on(
            Method::Post,
            api::LOGIN_PATH,
            MockReply::json(200, json!({"access": "a", "refresh": "r"})),
        );
        mock.on(
            Method::Get,
            api::PROFILE_PATH,
            MockReply::json(200, json!({"id": 7, "business_name": "Acme Deli"})),
        );

        let user = block_on(auth.login("Acme Deli".into(), "pw".into(), true)).unwrap();
        assert_eq!(user.id.as_str(), "7");
        assert_eq!(storage.get_item(keys::ACCESS).as_deref(), Some("a"));
        assert!(storage.contains(keys::AUTH_USER));
        assert_eq!(auth.remembered_business_name().as_deref(), Some("Acme Deli"));

        let profile = mock.last_request(Method::Get, api::PROFILE_PATH).unwrap();
        assert_eq!(profile.header("Authorization"), Some("Bearer a"));
    }

    #[test]
    fn test_logout_clears_theme_and_authorization() {
        let (auth, mock, storage) = setup();
        mock.on(
            Method::Get,
            api::PROFILE_PATH,
            MockReply::json(200, json!({"id": 7})),
        );
        storage.set_item(keys::ACCESS, "tok");
        storage.set_item(keys::REFRESH, "ref");
        block_on(auth.fetch_user());
        storage.set_item("theme-7", "dark");
        storage.set_item(keys::THEME_GUEST, "light");

        auth.logout();

        assert!(auth.user.get_untracked().is_none());
        assert!(!storage.contains("theme-7"));
        assert!(!storage.contains(keys::THEME_GUEST));
        assert!(!storage.contains(keys::AUTH_USER));
        assert!(!storage.contains(keys::ACCESS));

        let _ = block_on(auth.refresh_user());
        let after = mock.last_request(Method::Get, api::PROFILE_PATH).unwrap();
        assert_eq!(after.header("Authorization"), None);
    }
}
