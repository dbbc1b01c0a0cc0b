//! Outbound request construction
//!
//! Every request carries `Accept: application/json`, a `User-Agent` and a
//! fresh `X-Request-ID`. JSON bodies add `Content-Type: application/json`.

use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Request};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Media type for JSON bodies and responses
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Generate a request id (UUID v4)
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read the correlation id back off a built request
pub fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Builder for a single outbound request
///
/// Built fresh for every call and consumed by [`OutboundRequest::build`].
#[derive(Debug)]
pub struct OutboundRequest<'a> {
    client: &'a Client,
    method: Method,
    url: Url,
    user_agent: &'a str,
    body: Option<Vec<u8>>,
    bearer: Option<String>,
}

impl<'a> OutboundRequest<'a> {
    /// Start a request with the standard headers
    pub fn new(client: &'a Client, method: Method, url: Url, user_agent: &'a str) -> Self {
        Self {
            client,
            method,
            url,
            user_agent,
            body: None,
            bearer: None,
        }
    }

    /// JSON-encode `body` as the request payload
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body).map_err(Error::Encode)?);
        Ok(self)
    }

    /// Attach `Authorization: Bearer <token>`
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Finish the request, stamping a new request id
    pub fn build(self) -> Result<Request> {
        let mut req = self
            .client
            .request(self.method, self.url)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header(USER_AGENT, self.user_agent)
            .header(REQUEST_ID_HEADER, new_request_id());

        if let Some(body) = self.body {
            req = req
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(body);
        }

        if let Some(token) = self.bearer {
            req = req.bearer_auth(token);
        }

        req.build().map_err(Error::Http)
    }
}

/// Build a URL-encoded form POST with the standard headers
pub fn form_request<F: Serialize + ?Sized>(
    client: &Client,
    url: Url,
    form: &F,
    user_agent: &str,
) -> Result<Request> {
    client
        .post(url)
        .header(ACCEPT, JSON_CONTENT_TYPE)
        .header(USER_AGENT, user_agent)
        .header(REQUEST_ID_HEADER, new_request_id())
        .form(form)
        .build()
        .map_err(Error::Http)
}
