//! In-memory [`Transport`] that replays scripted replies.
//!
//! Replies are keyed by method and URL (query string excluded) and consumed in
//! order. Every request is recorded so tests can assert on what was sent.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{transport_err, SyncError};

#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    /// Simulated connection-level failure.
    Drop(String),
}

#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `method url` request.
    pub fn push(&self, method: Method, url: impl Into<String>, reply: Reply) -> &Self {
        self.routes
            .borrow_mut()
            .entry((method, url.into()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn respond(&self, method: Method, url: impl Into<String>, response: HttpResponse) -> &Self {
        self.push(method, url, Reply::Respond(response))
    }

    pub fn respond_json(
        &self,
        method: Method,
        url: impl Into<String>,
        status: u16,
        body: &serde_json::Value,
    ) -> &Self {
        self.respond(method, url, HttpResponse::new(status, body.to_string()))
    }

    /// Every request sent so far, in order.
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }

    pub fn sent_to(&self, method: Method) -> Vec<HttpRequest> {
        self.sent
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SyncError> {
        self.sent.borrow_mut().push(request.clone());
        let key = (request.method, request.url.clone());
        let reply = self
            .routes
            .borrow_mut()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Drop(message)) => Err(transport_err(&request.url, message)),
            None => Err(transport_err(
                &request.url,
                format!("no scripted reply for {} {}", request.method.as_str(), request.url),
            )),
        }
    }
}
