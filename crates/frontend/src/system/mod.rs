pub mod account;
pub mod auth;
pub mod notifications;
pub mod pages;
