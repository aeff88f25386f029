pub mod aggregate;

pub use aggregate::{normalize_product, normalize_products, Product, PRODUCT_LIST_RULES};
