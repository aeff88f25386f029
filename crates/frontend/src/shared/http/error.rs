use thiserror::Error;

/// Failure below HTTP: the request never produced a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
}

/// Error taxonomy surfaced to stores and UI.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    Timeout,
    Network,
    Server,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No signed-in user, or the session could not be refreshed.
    #[error("not authenticated")]
    Unauthenticated,
    #[error("resource not found")]
    NotFound,
    /// The endpoint for a whole feature is not deployed yet (404).
    #[error("{0} feature coming soon!")]
    FeatureUnavailable(&'static str),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    Decode(String),
    #[error("{0}")]
    Generic(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated => ErrorKind::Unauthenticated,
            ApiError::NotFound | ApiError::FeatureUnavailable(_) => ErrorKind::NotFound,
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Decode(_) | ApiError::Generic(_) => ErrorKind::Generic,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Re-label a 404 as "this feature is not available yet".
    pub fn feature_gate(self, feature: &'static str) -> Self {
        match self {
            ApiError::NotFound => ApiError::FeatureUnavailable(feature),
            other => other,
        }
    }

    /// Build from a non-success status and the response body. The API puts
    /// human-readable text in `detail`, `error` or `message`.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::Unauthenticated,
            404 => ApiError::NotFound,
            408 | 504 => ApiError::Timeout,
            _ => ApiError::Server {
                status,
                message: extract_message(body).unwrap_or_else(|| format!("HTTP {}", status)),
            },
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Network(msg) => ApiError::Network(msg),
            TransportError::Timeout => ApiError::Timeout,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
}
