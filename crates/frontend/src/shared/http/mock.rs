//! Scripted transport for store tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use super::error::TransportError;
use super::transport::{HttpRequest, HttpResponse, Method, Transport};

#[derive(Clone, Debug)]
pub enum MockReply {
    Respond {
        status: u16,
        body: String,
        /// Times the reply yields to the executor before resolving.
        yields: usize,
    },
    Timeout,
    Network,
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        MockReply::Respond {
            status,
            body: body.to_string(),
            yields: 0,
        }
    }

    pub fn status(status: u16) -> Self {
        MockReply::Respond {
            status,
            body: String::new(),
            yields: 0,
        }
    }

    pub fn delayed(self, n: usize) -> Self {
        match self {
            MockReply::Respond { status, body, .. } => MockReply::Respond {
                status,
                body,
                yields: n,
            },
            other => other,
        }
    }
}

/// Routes requests by method and URL path (query ignored). Replies queued for
/// a route are used in order; the last one repeats. Unrouted requests get 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    log: Mutex<Vec<HttpRequest>>,
}

fn route_path(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .find('/')
        .map(|i| &without_scheme[i..])
        .unwrap_or("/");
    path.split('?').next().unwrap_or(path).to_string()
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: Method, path: &str, reply: MockReply) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn total_calls(&self) -> usize {
        self.requests().len()
    }

    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && route_path(&r.url) == path)
            .count()
    }

    pub fn last_request(&self, method: Method, path: &str) -> Option<HttpRequest> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && route_path(&r.url) == path)
    }

    fn next_reply(&self, method: Method, path: &str) -> MockReply {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(MockReply::status(404)),
            Some(queue) => queue.front().cloned().unwrap_or(MockReply::status(404)),
            None => MockReply::status(404),
        }
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = route_path(&request.url);
        let method = request.method;
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match self.next_reply(method, &path) {
            MockReply::Respond {
                status,
                body,
                yields,
            } => {
                for _ in 0..yields {
                    YieldNow::default().await;
                }
                Ok(HttpResponse { status, body })
            }
            MockReply::Timeout => Err(TransportError::Timeout),
            MockReply::Network => Err(TransportError::Network("connection refused".into())),
        }
    }
}

/// Returns `Pending` once, waking itself, so other futures in a `join!` run.
#[derive(Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
