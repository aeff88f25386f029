//! Wall clock in milliseconds since the Unix epoch.

/// Current time. `Date.now()` in the browser, the system clock elsewhere.
pub fn now_millis() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// RFC 3339 rendering of a millisecond timestamp.
pub fn to_rfc3339(millis: u64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.to_rfc3339())
}
