use contracts::system::auth::{RefreshRequest, RefreshResponse};
use futures::channel::oneshot;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::ApiError;
use super::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::shared::api_utils::join_url;
use crate::system::auth::storage::TokenStore;

pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh/";

/// Endpoints that must never carry a bearer token and never trigger a
/// refresh: obtaining a token is what they are for.
const PUBLIC_PATHS: [&str; 4] = [
    "/api/token/",
    "/api/auth/signup/",
    "/api/auth/password/forgot/",
    "/api/auth/password/reset/",
];

fn path_of(url: &str) -> &str {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
        }
        None => url,
    }
}

fn is_public(url: &str) -> bool {
    let path = path_of(url);
    PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

/// True when `url` points at the API origin; credentials go nowhere else.
fn is_same_origin(origin: &str, url: &str) -> bool {
    url.strip_prefix(origin.trim_end_matches('/'))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type ExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Refresh coordination: while one refresh is in flight, every other caller
/// that hits a 401 parks a sender here and is woken with the outcome.
#[derive(Default)]
struct RefreshGate {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Option<String>>>,
}

struct Inner {
    origin: String,
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    gate: Mutex<RefreshGate>,
    on_expired: Mutex<Option<ExpiredHook>>,
}

/// Authenticated JSON client for the storefront API.
///
/// Cheap to clone; all clones share the token store and refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(origin: impl Into<String>, transport: Arc<dyn Transport>, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                origin: origin.into(),
                transport,
                tokens,
                gate: Mutex::new(RefreshGate::default()),
                on_expired: Mutex::new(None),
            }),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Called once when the session ends because tokens could not be renewed.
    pub fn set_session_expired_hook(&self, hook: Option<ExpiredHook>) {
        *lock(&self.inner.on_expired) = hook;
    }

    // ------------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.get_value(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_value(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.send(Method::Get, path, None).await?;
        parse_body(&response)
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let response = self.send(Method::Post, path, Some(serde_json::to_value(body)?)).await?;
        parse_body(&response)
    }

    pub async fn post_as<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = self.post(path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let response = self.send(Method::Put, path, Some(serde_json::to_value(body)?)).await?;
        parse_body(&response)
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let response = self.send(Method::Patch, path, Some(serde_json::to_value(body)?)).await?;
        parse_body(&response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, None).await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Core
    // ------------------------------------------------------------------------

    /// Send a request, attaching the bearer token and renewing it once on 401.
    /// Public paths and other hosts get neither.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse, ApiError> {
        let url = join_url(&self.inner.origin, path);
        if is_public(&url) || !is_same_origin(&self.inner.origin, &url) {
            let response = self.dispatch(method, &url, body, None).await?;
            return check(response);
        }

        let token = self.inner.tokens.access_token();
        let response = self
            .dispatch(method, &url, body.clone(), token.as_deref())
            .await?;
        if response.status != 401 {
            return check(response);
        }

        log::debug!("{} {} answered 401, refreshing token", method.as_str(), path);
        match self.refresh_access_token().await {
            Some(fresh) => {
                let retry = self.dispatch(method, &url, body, Some(&fresh)).await?;
                check(retry)
            }
            None => {
                self.expire_session();
                Err(ApiError::Unauthenticated)
            }
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `None` straight away, without touching the network, when no
    /// refresh token is stored. Concurrent callers share one refresh request.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let refresh = self.inner.tokens.refresh_token()?;

        let waiter = {
            let mut gate = lock(&self.inner.gate);
            if gate.in_flight {
                let (tx, rx) = oneshot::channel();
                gate.waiters.push(tx);
                Some(rx)
            } else {
                gate.in_flight = true;
                None
            }
        };
        if let Some(rx) = waiter {
            return rx.await.ok().flatten();
        }

        let outcome = self.request_new_access(refresh).await;

        let waiters = {
            let mut gate = lock(&self.inner.gate);
            gate.in_flight = false;
            std::mem::take(&mut gate.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    async fn request_new_access(&self, refresh: String) -> Option<String> {
        let url = join_url(&self.inner.origin, TOKEN_REFRESH_PATH);
        let body = match serde_json::to_value(RefreshRequest { refresh }) {
            Ok(body) => body,
            Err(e) => {
                log::error!("Failed to serialize refresh request: {}", e);
                return None;
            }
        };
        let response = match self.dispatch(Method::Post, &url, Some(body), None).await {
            Ok(r) if r.ok() => r,
            Ok(r) => {
                log::warn!("Token refresh rejected: {}", r.status);
                return None;
            }
            Err(e) => {
                log::warn!("Token refresh failed: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<RefreshResponse>(&response.body) {
            Ok(fresh) => {
                self.inner
                    .tokens
                    .save_tokens(&fresh.access, fresh.refresh.as_deref());
                Some(fresh.access)
            }
            Err(e) => {
                log::warn!("Unreadable token refresh response: {}", e);
                None
            }
        }
    }

    /// Drop tokens and notify the app. The hook fires only if there was a
    /// session to lose, so a burst of failing requests notifies once.
    fn expire_session(&self) {
        let had_session = self.inner.tokens.has_session();
        self.inner.tokens.clear();
        if !had_session {
            return;
        }
        log::info!("Session expired, tokens cleared");
        let hook = lock(&self.inner.on_expired).clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = HttpRequest::new(method, url);
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        if let Some(token) = token {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        request.body = body;
        Ok(self.inner.transport.send(request).await?)
    }
}

fn check(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.ok() {
        Ok(response)
    } else {
        Err(ApiError::from_status(response.status, &response.body))
    }
}

/// JSON body, with an empty body (204, bare 200) read as `null`.
fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}
