//! HTTP access to the storefront API.
//!
//! [`Transport`] moves bytes; [`ApiClient`] adds bearer auth, the
//! single-flight token refresh and status-to-error mapping on top of it.

pub mod client;
pub mod error;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use client::ApiClient;
pub use error::{ApiError, ErrorKind, TransportError};
pub use transport::{GlooTransport, HttpRequest, HttpResponse, Method, Transport};

/// Hook to access the shared API client
pub fn use_api_client() -> ApiClient {
    leptos::prelude::use_context::<ApiClient>().expect("ApiClient not found in component tree")
}
