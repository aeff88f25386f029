use contracts::enums::theme::Theme;
use contracts::system::auth::{LoginRequest, SignupRequest, ThemePayload, TokenPair, UserProfile};

use crate::shared::http::{ApiClient, ApiError};

pub const LOGIN_PATH: &str = "/api/token/";
pub const SIGNUP_PATH: &str = "/api/auth/signup/";
pub const PROFILE_PATH: &str = "/api/profile/";
pub const THEME_PATH: &str = "/api/profile/theme/";

/// Login with business name and password
pub async fn login(
    client: &ApiClient,
    business_name: String,
    password: String,
) -> Result<TokenPair, ApiError> {
    let request = LoginRequest {
        business_name,
        password,
    };
    client.post_as(LOGIN_PATH, &request).await
}

/// Register a new customer account
pub async fn signup(client: &ApiClient, request: &SignupRequest) -> Result<(), ApiError> {
    client.post(SIGNUP_PATH, request).await.map(|_| ())
}

/// Get current user info
pub async fn fetch_profile(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.get(PROFILE_PATH).await
}

/// Theme stored on the backend; `None` when the value is unknown.
pub async fn fetch_theme(client: &ApiClient) -> Result<Option<Theme>, ApiError> {
    let payload: ThemePayload = client.get(THEME_PATH).await?;
    Ok(Theme::parse(&payload.theme))
}

pub async fn save_theme(client: &ApiClient, theme: Theme) -> Result<(), ApiError> {
    let payload = ThemePayload {
        theme: theme.as_str().to_string(),
    };
    client.patch(THEME_PATH, &payload).await.map(|_| ())
}
