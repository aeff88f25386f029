//! Account endpoints outside the auth flow: addresses, support, password
//! recovery and the ordering PIN.

use contracts::domain::a006_address::{Address, AddressDto};
use contracts::shared::envelope::{ListPayload, ShapeRules};
use contracts::shared::ids::EntityId;
use contracts::system::account::{
    is_valid_pin, ForgotPasswordRequest, PinRequest, PinValidation, ResetPasswordRequest,
    SupportMessageRequest,
};

use crate::shared::api_utils::segment;
use crate::shared::http::{ApiClient, ApiError};

pub const ADDRESSES_PATH: &str = "/api/addresses/";
pub const SUPPORT_MESSAGES_PATH: &str = "/api/support/messages/";
pub const PASSWORD_FORGOT_PATH: &str = "/api/auth/password/forgot/";
pub const PASSWORD_RESET_PATH: &str = "/api/auth/password/reset/";
pub const PIN_SET_PATH: &str = "/api/profile/pin/";
pub const PIN_VALIDATE_PATH: &str = "/api/profile/pin/validate/";

const ADDRESS_RULES: ShapeRules = ShapeRules::keyed(&["results", "addresses"]);

fn address_path(id: &EntityId) -> String {
    format!("{}{}/", ADDRESSES_PATH, segment(id.as_str()))
}

// ============================================================================
// Addresses
// ============================================================================

pub async fn fetch_addresses(client: &ApiClient) -> Result<Vec<Address>, ApiError> {
    let payload = client.get_value(ADDRESSES_PATH).await?;
    Ok(ListPayload::detect(&payload, &ADDRESS_RULES)
        .into_rows()
        .into_iter()
        .filter_map(|row| serde_json::from_value::<Address>(row).ok())
        .collect())
}

pub async fn create_address(client: &ApiClient, dto: &AddressDto) -> Result<Address, ApiError> {
    client.post_as(ADDRESSES_PATH, dto).await
}

pub async fn update_address(
    client: &ApiClient,
    id: &EntityId,
    dto: &AddressDto,
) -> Result<Address, ApiError> {
    let value = client.put(&address_path(id), dto).await?;
    Ok(serde_json::from_value(value)?)
}

pub async fn delete_address(client: &ApiClient, id: &EntityId) -> Result<(), ApiError> {
    client.delete(&address_path(id)).await
}

// ============================================================================
// Support
// ============================================================================

pub async fn send_support_message(
    client: &ApiClient,
    request: &SupportMessageRequest,
) -> Result<(), ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::Generic("Message must not be empty".into()));
    }
    client.post(SUPPORT_MESSAGES_PATH, request).await.map(|_| ())
}

// ============================================================================
// Password recovery
// ============================================================================

pub async fn forgot_password(client: &ApiClient, email: &str) -> Result<(), ApiError> {
    let request = ForgotPasswordRequest {
        email: email.trim().to_string(),
    };
    client.post(PASSWORD_FORGOT_PATH, &request).await.map(|_| ())
}

pub async fn reset_password(
    client: &ApiClient,
    token: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let request = ResetPasswordRequest {
        token: token.to_string(),
        new_password: new_password.to_string(),
    };
    client.post(PASSWORD_RESET_PATH, &request).await.map(|_| ())
}

// ============================================================================
// PIN
// ============================================================================

pub async fn set_pin(client: &ApiClient, pin: &str) -> Result<(), ApiError> {
    if !is_valid_pin(pin) {
        return Err(ApiError::Generic("PIN must be 4 to 6 digits".into()));
    }
    let request = PinRequest {
        pin: pin.to_string(),
    };
    client.post(PIN_SET_PATH, &request).await.map(|_| ())
}

pub async fn validate_pin(client: &ApiClient, pin: &str) -> Result<bool, ApiError> {
    if !is_valid_pin(pin) {
        return Ok(false);
    }
    let request = PinRequest {
        pin: pin.to_string(),
    };
    let answer: PinValidation = client.post_as(PIN_VALIDATE_PATH, &request).await?;
    Ok(answer.valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::{keys, KeyValueStorage, MemoryStorage};
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> (ApiClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(keys::ACCESS, "tok");
        (
            ApiClient::new("http://api.test", mock.clone(), TokenStore::new(storage)),
            mock,
        )
    }

    #[test]
    fn test_address_crud() {
        let (client, mock) = client();
        mock.on(
            Method::Get,
            ADDRESSES_PATH,
            MockReply::json(200, json!({"results": [{"id": 1, "line1": "1 Main St", "city": "Leeds"}]})),
        );
        mock.on(
            Method::Post,
            ADDRESSES_PATH,
            MockReply::json(201, json!({"id": 2, "line1": "2 High St", "city": "York"})),
        );
        mock.on(
            Method::Put,
            "/api/addresses/2/",
            MockReply::json(200, json!({"id": 2, "line1": "2 High St", "city": "York", "is_default": true})),
        );
        mock.on(Method::Delete, "/api/addresses/2/", MockReply::status(204));

        let list = block_on(fetch_addresses(&client)).unwrap();
        assert_eq!(list[0].summary(), "1 Main St, Leeds");

        let dto = AddressDto {
            line1: "2 High St".into(),
            city: "York".into(),
            ..AddressDto::default()
        };
        let created = block_on(create_address(&client, &dto)).unwrap();
        assert_eq!(created.id.as_str(), "2");
        let updated = block_on(update_address(&client, &created.id, &dto)).unwrap();
        assert!(updated.is_default);
        block_on(delete_address(&client, &created.id)).unwrap();
        assert_eq!(mock.calls(Method::Delete, "/api/addresses/2/"), 1);
    }

    #[test]
    fn test_password_endpoints_are_anonymous() {
        let (client, mock) = client();
        mock.on(Method::Post, PASSWORD_FORGOT_PATH, MockReply::json(200, json!({})));
        mock.on(Method::Post, PASSWORD_RESET_PATH, MockReply::json(200, json!({})));

        block_on(forgot_password(&client, " owner@acme.test ")).unwrap();
        block_on(reset_password(&client, "t0k", "n3w-pass")).unwrap();

        let forgot = mock.last_request(Method::Post, PASSWORD_FORGOT_PATH).unwrap();
        assert_eq!(forgot.header("Authorization"), None);
        assert_eq!(forgot.body, Some(json!({"email": "owner@acme.test"})));
    }

    #[test]
    fn test_pin_is_checked_before_sending() {
        let (client, mock) = client();
        mock.on(Method::Post, PIN_VALIDATE_PATH, MockReply::json(200, json!({"valid": true})));

        assert!(block_on(set_pin(&client, "12")).is_err());
        assert!(!block_on(validate_pin(&client, "abcd")).unwrap());
        assert_eq!(mock.total_calls(), 0);

        assert!(block_on(validate_pin(&client, "4321")).unwrap());
    }

    #[test]
    fn test_support_message() {
        let (client, mock) = client();
        mock.on(Method::Post, SUPPORT_MESSAGES_PATH, MockReply::json(201, json!({"id": 1})));
        let request = SupportMessageRequest {
            subject: "Late delivery".into(),
            message: "Order 17 has not arrived".into(),
            order_id: Some("17".into()),
        };
        block_on(send_support_message(&client, &request)).unwrap();
        let sent = mock.last_request(Method::Post, SUPPORT_MESSAGES_PATH).unwrap();
        assert_eq!(sent.header("Authorization"), Some("Bearer tok"));
    }
}
