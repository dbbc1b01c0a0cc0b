//! Transport executor
//!
//! Sends a built request, classifies the outcome and decodes JSON bodies:
//! - the caller's context races the exchange and wins if it fires first
//! - HTTP 429 becomes `Error::RateLimitExceeded` without touching the body
//! - other non-2xx statuses become `Error::HttpStatus`
//! - decode failures keep the response metadata for diagnostics

use super::context::Context;
use super::request::{form_request, request_id};
use super::response::Response;
use crate::error::{Error, Result};
use reqwest::{Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Timeouts applied by the default transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect timeout; reqwest's connector also covers the TLS handshake
    pub connect_timeout: Duration,
    /// Overall request timeout
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Executes requests on a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    /// Create a transport with the default timeouts
    pub fn new() -> Result<Self> {
        Self::with_config(&TransportConfig::default())
    }

    /// Create a transport with custom timeouts
    pub fn with_config(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap a caller-supplied client as-is
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send `request` and decode a JSON body into `T`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
    ) -> Result<(T, Response)> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let request_id = request_id(&request);
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{} {} (request {})", method, url, request_id);

        let sent = tokio::select! {
            biased;
            err = ctx.done() => {
                warn!("{} {} aborted: {}", method, url, err);
                return Err(err);
            }
            sent = self.client.execute(request) => sent,
        };

        // the context error says more than the raw transport error
        let response = sent.map_err(|e| ctx.err().unwrap_or(Error::Http(e)))?;
        let meta = Response::new(&response, request_id);

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = extract_retry_after(&response);
            warn!(
                "Rate limited (429) on {} {} (request {})",
                method,
                url,
                meta.request_id()
            );
            return Err(Error::RateLimitExceeded {
                request_id: meta.request_id().to_string(),
                retry_after_seconds,
            });
        }

        let body = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            body = response.bytes() => body.map_err(|e| ctx.err().unwrap_or(Error::Http(e)))?,
        };

        if !meta.is_success() {
            debug!("{} {} failed with {}", method, url, meta.status());
            return Err(Error::HttpStatus {
                status: meta.status().as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
                response: Box::new(meta),
            });
        }

        match serde_json::from_slice(&body) {
            Ok(value) => {
                debug!("Request succeeded: {} {}", method, url);
                Ok((value, meta))
            }
            Err(source) => Err(Error::Decode {
                source,
                response: Box::new(meta),
            }),
        }
    }

    /// POST a URL-encoded form and decode a JSON body into `T`
    pub async fn execute_form<T, F>(
        &self,
        ctx: &Context,
        url: Url,
        form: &F,
        user_agent: &str,
    ) -> Result<(T, Response)>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let request = form_request(&self.client, url, form, user_agent)?;
        self.execute(ctx, request).await
    }
}

/// Extract retry-after header value (seconds form only)
fn extract_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
