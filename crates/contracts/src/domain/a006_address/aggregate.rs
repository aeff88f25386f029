use serde::{Deserialize, Serialize};

use crate::shared::ids::EntityId;
use crate::shared::lenient;

/// Delivery address saved on the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: EntityId,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub label: Option<String>,
    #[serde(default)]
    pub line1: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_default: bool,
}

impl Address {
    /// One-line rendering for pickers.
    pub fn summary(&self) -> String {
        let mut parts: Vec<&str> = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref() {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        if let Some(code) = self.postal_code.as_deref() {
            parts.push(code);
        }
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Create/update payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_skips_empty_parts() {
        let address: Address = serde_json::from_value(json!({
            "id": 4, "line1": "1 Main St", "city": "Springfield", "postal_code": 12345
        }))
        .unwrap();
        assert_eq!(address.summary(), "1 Main St, Springfield, 12345");
        assert!(!address.is_default);
    }
}
