use contracts::domain::a004_product::{normalize_product, normalize_products, Product};
use contracts::shared::envelope::next_page;
use serde::Serialize;
use serde_json::Value;

use crate::shared::api_utils::segment;
use crate::shared::http::{ApiClient, ApiError};

pub const API_ROOT_PATH: &str = "/api/";
pub const PRODUCTS_FALLBACK_PATH: &str = "/api/products/";

/// Upper bound on `next` links followed for one catalog load.
pub const MAX_PAGES: usize = 20;

/// Optional catalog filters, sent as a query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductQuery {
    fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none()
    }

    /// `base` with this query appended.
    fn apply(&self, base: &str) -> String {
        if self.is_empty() {
            return base.to_string();
        }
        match serde_qs::to_string(self) {
            Ok(qs) => {
                let sep = if base.contains('?') { '&' } else { '?' };
                format!("{}{}{}", base, sep, qs)
            }
            Err(e) => {
                log::warn!("Failed to encode product query: {}", e);
                base.to_string()
            }
        }
    }
}

/// Products endpoint advertised by the API root, `/api/products/` when the
/// root lists none.
pub async fn discover_products_url(client: &ApiClient) -> Result<String, ApiError> {
    let root = client.get_value(API_ROOT_PATH).await?;
    let url = root
        .get("products")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(url.unwrap_or_else(|| PRODUCTS_FALLBACK_PATH.to_string()))
}

/// Whole catalog: discovery, then every page up to [`MAX_PAGES`].
pub async fn fetch_catalog(client: &ApiClient, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
    let first = query.apply(&discover_products_url(client).await?);
    let mut products = Vec::new();
    let mut next = Some(first);
    let mut pages = 0;

    while let Some(url) = next.take() {
        if pages == MAX_PAGES {
            log::warn!("Catalog truncated after {} pages", MAX_PAGES);
            break;
        }
        let page = client.get_value(&url).await?;
        products.extend(normalize_products(&page));
        next = next_page(&page);
        pages += 1;
    }

    log::debug!("Loaded {} products from {} page(s)", products.len(), pages);
    Ok(products)
}

/// One product by slug, for the product page.
pub async fn product_detail(client: &ApiClient, slug: &str) -> Result<Product, ApiError> {
    let path = format!("{}{}/", PRODUCTS_FALLBACK_PATH, segment(slug));
    let value = client.get_value(&path).await?;
    normalize_product(&value).ok_or_else(|| ApiError::Decode(format!("product {} is not an object", slug)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::http::mock::{MockReply, MockTransport};
    use crate::shared::http::Method;
    use crate::shared::storage::MemoryStorage;
    use crate::system::auth::storage::TokenStore;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> (ApiClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        (ApiClient::new("http://api.test", mock.clone(), tokens), mock)
    }

    #[test]
    fn test_follows_root_link_and_pages() {
        let (client, mock) = client();
        mock.on(
            Method::Get,
            API_ROOT_PATH,
            MockReply::json(200, json!({"products": "http://api.test/api/v2/catalog/"})),
        );
        mock.on(
            Method::Get,
            "/api/v2/catalog/",
            MockReply::json(
                200,
                json!({"results": [{"id": 1, "name": "Flour"}], "next": "http://api.test/api/v2/catalog/?page=2"}),
            ),
        );
        mock.on(
            Method::Get,
            "/api/v2/catalog/",
            MockReply::json(200, json!({"data": [{"id": 2, "name": "Sugar"}], "next": null})),
        );

        let products = block_on(fetch_catalog(&client, &ProductQuery::default())).unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Flour", "Sugar"]);
        assert_eq!(mock.calls(Method::Get, "/api/v2/catalog/"), 2);
    }

    #[test]
    fn test_root_without_link_falls_back() {
        let (client, mock) = client();
        mock.on(Method::Get, API_ROOT_PATH, MockReply::json(200, json!({})));
        mock.on(
            Method::Get,
            PRODUCTS_FALLBACK_PATH,
            MockReply::json(200, json!([{"id": 3, "name": "Salt"}])),
        );

        let query = ProductQuery {
            search: Some("salt".into()),
            category: None,
        };
        let products = block_on(fetch_catalog(&client, &query)).unwrap();
        assert_eq!(products.len(), 1);
        let sent = mock.last_request(Method::Get, PRODUCTS_FALLBACK_PATH).unwrap();
        assert!(sent.url.ends_with("/api/products/?search=salt"));
    }

    #[test]
    fn test_page_limit_stops_cycles() {
        let (client, mock) = client();
        mock.on(Method::Get, API_ROOT_PATH, MockReply::json(200, json!({})));
        mock.on(
            Method::Get,
            PRODUCTS_FALLBACK_PATH,
            MockReply::json(
                200,
                json!({"products": [{"id": 1}], "next": "/api/products/"}),
            ),
        );

        let products = block_on(fetch_catalog(&client, &ProductQuery::default())).unwrap();
        assert_eq!(products.len(), MAX_PAGES);
    }

    #[test]
    fn test_product_detail() {
        let (client, mock) = client();
        mock.on(
            Method::Get,
            "/api/products/rye-bread/",
            MockReply::json(200, json!({"id": 8, "title": "Rye bread", "price": 3})),
        );
        let product = block_on(product_detail(&client, "rye-bread")).unwrap();
        assert_eq!(product.name, "Rye bread");
        assert!(block_on(product_detail(&client, "missing")).unwrap_err().is_not_found());
    }
}
