pub mod aggregate;
pub mod dto;

pub use aggregate::{cart_count, cart_total, normalize_cart, normalize_cart_item, CartItem, CART_RULES};
pub use dto::{AddToCartRequest, CheckoutResponse, RemoveCartItemRequest, UpdateCartItemRequest};
