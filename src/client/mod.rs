//! PDS client
//!
//! Owns the base URL, user agent, transport and optional token provider.
//! Cheap to clone; clones share the connection pool and the token cache.

mod builder;

pub use builder::ClientBuilder;

use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::error::{Error, Result, UrlError};
use crate::http::{Context, OutboundRequest, Response, Transport};
use crate::patient::PatientService;
use reqwest::{Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// PDS sandbox; requests to it never carry credentials
pub const DEFAULT_BASE_URL: &str =
    "https://sandbox.api.service.nhs.uk/personal-demographics/FHIR/R4/";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("nhs-fhir/", env!("CARGO_PKG_VERSION"));

/// Client for the Personal Demographics Service FHIR API
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    user_agent: String,
    transport: Transport,
    auth: Option<Arc<dyn TokenProvider>>,
}

impl Client {
    /// Sandbox client without authentication
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from a loaded configuration file
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.to_builder()?.build()
    }

    /// Base URL, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether requests go to the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.base_url.as_str() == DEFAULT_BASE_URL
    }

    /// Whether a token provider is configured
    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Build a request for `path`, relative to the base URL
    ///
    /// Leading slashes are ignored so paths never escape the base. When auth
    /// is configured and the base is not the sandbox, a bearer token is
    /// fetched (or taken from the cache) and attached; failing to get one
    /// fails the request.
    pub async fn new_request<B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidUrl(UrlError::Parse(e)))?;

        let mut request = OutboundRequest::new(self.transport.inner(), method, url, &self.user_agent);

        if let Some(body) = body {
            request = request.json(body)?;
        }

        if let Some(auth) = self.auth.as_ref().filter(|_| !self.is_sandbox()) {
            let token = auth.access_token(ctx).await?;
            request = request.bearer(token);
        } else if self.auth.is_some() {
            debug!("Sandbox base URL, skipping authentication");
        }

        request.build()
    }

    /// Execute a request built by [`new_request`](Self::new_request)
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
    ) -> Result<(T, Response)> {
        self.transport.execute(ctx, request).await
    }

    /// Patient operations
    pub fn patient(&self) -> PatientService<'_> {
        PatientService::new(self)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("has_auth", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}
