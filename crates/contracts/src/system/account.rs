use serde::{Deserialize, Serialize};

use crate::shared::lenient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportMessageRequest {
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinValidation {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub valid: bool,
}

/// A PIN is 4 to 6 digits.
pub fn is_valid_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.chars().all(|c| c.is_ascii_digit())
}
