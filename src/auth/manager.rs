//! Token manager
//!
//! Exchanges a client assertion for an access token and caches both.
//! Concurrent callers share one renewal: the first one through the write
//! lock fetches, the rest find a fresh token on the double check.

use super::assertion::mint_assertion;
use super::types::{AccessToken, ClientIdentity, TokenResponse};
use crate::error::Result;
use crate::http::{Context, Response, Transport};
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// OAuth2 grant used for the token exchange
pub const GRANT_TYPE: &str = "client_credentials";

/// Assertion type sent alongside the signed JWT
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Source of bearer tokens for outgoing requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid bearer token
    async fn access_token(&self, ctx: &Context) -> Result<String>;
}

impl fmt::Debug for dyn TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenProvider")
    }
}

/// A fixed bearer token, for callers who obtain tokens elsewhere
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self, _ctx: &Context) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct TokenState {
    /// Minted once and reused for the manager's lifetime
    assertion: Option<String>,
    token: Option<AccessToken>,
}

/// Client-credentials token manager for signed JWT authentication
pub struct TokenManager {
    identity: ClientIdentity,
    token_url: Url,
    transport: Transport,
    user_agent: String,
    state: RwLock<TokenState>,
}

impl TokenManager {
    /// Validate `identity` and create a manager with an empty cache
    pub fn new(
        identity: ClientIdentity,
        transport: Transport,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        identity.validate()?;
        let token_url = identity.token_url()?;
        Ok(Self {
            identity,
            token_url,
            transport,
            user_agent: user_agent.into(),
            state: RwLock::new(TokenState::default()),
        })
    }

    /// The identity tokens are requested for
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Return the cached token, renewing it when absent or expired
    pub async fn access_token(&self, ctx: &Context) -> Result<String> {
        {
            let state = self.state.read().await;
            if let Some(token) = state.token.as_ref().filter(|t| !t.is_expired()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut state = self.state.write().await;

        // another caller may have renewed while we waited
        if let Some(token) = state.token.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.access_token.clone());
        }

        let assertion = match &state.assertion {
            Some(assertion) => assertion.clone(),
            None => {
                let assertion = mint_assertion(&self.identity)?;
                state.assertion = Some(assertion.clone());
                assertion
            }
        };

        let token = self.request_token(ctx, &assertion).await?;
        info!(
            "Obtained access token for {}, expires in {}s",
            self.identity.client_id, token.expires_in
        );

        let bearer = token.access_token.clone();
        state.token = Some(token);
        Ok(bearer)
    }

    /// Currently cached token, expired or not
    pub async fn cached_token(&self) -> Option<AccessToken> {
        self.state.read().await.token.clone()
    }

    /// Drop the cached token and assertion; the next call mints a new assertion
    pub async fn clear_cache(&self) {
        let mut state = self.state.write().await;
        state.token = None;
        state.assertion = None;
    }

    #[cfg(test)]
    pub(crate) async fn seed_token(&self, token: AccessToken) {
        self.state.write().await.token = Some(token);
    }

    async fn request_token(&self, ctx: &Context, assertion: &str) -> Result<AccessToken> {
        debug!("Requesting access token from {}", self.token_url);

        let form = [
            ("grant_type", GRANT_TYPE),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion),
        ];

        let (response, _meta): (TokenResponse, Response) = self
            .transport
            .execute_form(ctx, self.token_url.clone(), &form, &self.user_agent)
            .await?;

        Ok(response.into_access_token(Utc::now().timestamp_millis()))
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("identity", &self.identity)
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn access_token(&self, ctx: &Context) -> Result<String> {
        TokenManager::access_token(self, ctx).await
    }
}
