pub mod aggregate;

pub use aggregate::{normalize_orders, Order, PlaceOrderLine, PlaceOrderRequest, ORDER_RULES};
