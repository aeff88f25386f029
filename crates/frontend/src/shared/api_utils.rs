//! API utilities for frontend-backend communication
//!
//! Resolves the API origin from the page location and builds request URLs.

/// Hosts treated as a local development setup.
const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

/// Origin of the development API server.
pub const LOCAL_API_ORIGIN: &str = "http://127.0.0.1:8000";

/// Resolve the API origin for a page served from `protocol//hostname`.
///
/// Local hosts talk to the development server. Deployed builds use the
/// origin baked in at compile time through `STOREFRONT_API_ORIGIN`, or the
/// `api.` subdomain of the page host when none was given.
pub fn resolve_api_origin(protocol: &str, hostname: &str) -> String {
    if LOCAL_HOSTS.contains(&hostname) {
        return LOCAL_API_ORIGIN.to_string();
    }
    match option_env!("STOREFRONT_API_ORIGIN") {
        Some(origin) if !origin.is_empty() => origin.trim_end_matches('/').to_string(),
        _ => format!("{}//api.{}", protocol, hostname),
    }
}

/// Get the base URL for API requests from the current window location.
///
/// # Returns
/// - API origin like "http://127.0.0.1:8000" or "https://api.example.com"
/// - The local origin when no window is available (native tests)
pub fn api_base() -> String {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            let location = window.location();
            let protocol = location.protocol().unwrap_or_else(|_| "https:".to_string());
            let hostname = location
                .hostname()
                .unwrap_or_else(|_| "127.0.0.1".to_string());
            return resolve_api_origin(&protocol, &hostname);
        }
    }
    LOCAL_API_ORIGIN.to_string()
}

/// Join an origin and a path, or pass through a link that is already
/// absolute (discovery endpoints and `next` page links are absolute).
pub fn join_url(origin: &str, path_or_url: &str) -> String {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        return path_or_url.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if path_or_url.starts_with('/') {
        format!("{}{}", origin, path_or_url)
    } else {
        format!("{}/{}", origin, path_or_url)
    }
}

/// Percent-encode a path segment taken from user data (slugs, ids).
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
