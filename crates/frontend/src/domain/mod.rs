pub mod a001_cart;
pub mod a002_smart_list;
pub mod a003_order;
pub mod a004_product;
