//! Scripted [`Transport`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::http::{HttpResponse, Transport};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Route {
    method: Method,
    url: String,
    body_contains: Option<String>,
    reply: Option<HttpResponse>,
}

/// Answers requests from a route table; unmatched requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method: Method::Get,
            url: url.to_string(),
            body_contains: None,
            reply: Some(HttpResponse::new(status, body)),
        });
        self
    }

    /// Route a POST whose serialized JSON body contains `needle`.
    pub fn on_post(mut self, url: &str, needle: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method: Method::Post,
            url: url.to_string(),
            body_contains: Some(needle.to_string()),
            reply: Some(HttpResponse::new(status, body)),
        });
        self
    }

    /// Make every request to `url` fail at the transport level.
    pub fn fail(mut self, method: Method, url: &str) -> Self {
        self.routes.push(Route {
            method,
            url: url.to_string(),
            body_contains: None,
            reply: None,
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, url_prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.url.starts_with(url_prefix))
            .count()
    }

    fn answer(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });

        let serialized = body.map(|b| b.to_string()).unwrap_or_default();
        let route = self.routes.iter().find(|r| {
            r.method == method
                && r.url == url
                && r.body_contains
                    .as_deref()
                    .is_none_or(|needle| serialized.contains(needle))
        });
        match route {
            Some(Route { reply: Some(reply), .. }) => Ok(reply.clone()),
            Some(Route { reply: None, .. }) => Err(AppError::upstream(url, "connection refused")),
            None => Ok(HttpResponse::new(404, "Not Found")),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.answer(Method::Get, url, headers, None)
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        self.answer(Method::Post, url, headers, Some(body))
    }
}
