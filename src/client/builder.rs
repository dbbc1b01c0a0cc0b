//! Client builder

use super::{Client, DEFAULT_BASE_URL};
use crate::auth::{ClientIdentity, TokenManager, TokenProvider};
use crate::error::Result;
use crate::http::{Transport, TransportConfig};
use crate::validation::validate_absolute_url;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

enum AuthSource {
    Jwt(ClientIdentity),
    Provider(Arc<dyn TokenProvider>),
}

/// Builder for [`Client`]
///
/// Defaults: the PDS sandbox base URL, no authentication, and a transport
/// with a 5s connect timeout and a 10s overall timeout.
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    user_agent: Option<String>,
    http_client: Option<reqwest::Client>,
    transport: TransportConfig,
    auth: Option<AuthSource>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL; a trailing slash is added when missing
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a preconfigured reqwest client; timeouts set here are ignored
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the overall request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport.connect_timeout = timeout;
        self
    }

    /// Authenticate with signed JWT client credentials
    ///
    /// The identity is validated by [`build`](Self::build).
    #[must_use]
    pub fn jwt_auth(mut self, identity: ClientIdentity) -> Self {
        self.auth = Some(AuthSource::Jwt(identity));
        self
    }

    /// Authenticate with a custom token provider
    #[must_use]
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.auth = Some(AuthSource::Provider(provider));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let transport = match self.http_client {
            Some(client) => Transport::from_client(client),
            None => Transport::with_config(&self.transport)?,
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| super::DEFAULT_USER_AGENT.to_string());

        let auth: Option<Arc<dyn TokenProvider>> = match self.auth {
            Some(AuthSource::Jwt(identity)) => Some(Arc::new(TokenManager::new(
                identity,
                transport.clone(),
                user_agent.clone(),
            )?)),
            Some(AuthSource::Provider(provider)) => Some(provider),
            None => None,
        };

        Ok(Client {
            base_url,
            user_agent,
            transport,
            auth,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = validate_absolute_url(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
