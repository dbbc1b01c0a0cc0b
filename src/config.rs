//! Client configuration loaded from YAML
//!
//! ```yaml
//! base_url: "https://int.api.service.nhs.uk/personal-demographics/FHIR/R4/"
//! user_agent: "my-app/1.0"
//! timeout_secs: 10
//! auth:
//!   type: jwt
//!   base_url: "https://int.api.service.nhs.uk"
//!   client_id: "my-client-id"
//!   kid: "test-1"
//!   private_key_file: "keys/private.pem"
//! ```
//!
//! JSON is accepted too, being a subset of YAML.

use crate::auth::{ClientIdentity, StaticToken};
use crate::client::ClientBuilder;
use crate::error::{Error, Result};
use crate::types::{JwtAlgorithm, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// API base URL; the sandbox when omitted
    #[serde(default)]
    pub base_url: Option<String>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Overall request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Connect timeout in seconds
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfigDef,
}

impl ClientConfig {
    /// Load from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        content.parse()
    }

    /// Turn the configuration into a builder
    ///
    /// Fails when a key is expected in an environment variable that is unset.
    pub fn to_builder(&self) -> Result<ClientBuilder> {
        let mut builder = ClientBuilder::new();

        if let Some(base_url) = self.base_url.clone().none_if_empty() {
            builder = builder.base_url(base_url);
        }
        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        builder = match &self.auth {
            AuthConfigDef::None => builder,
            AuthConfigDef::Bearer { token } => builder.token_provider(Arc::new(StaticToken::new(token))),
            AuthConfigDef::Jwt(jwt) => builder.jwt_auth(jwt.to_identity()?),
        };

        Ok(builder)
    }
}

impl std::str::FromStr for ClientConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

// ============================================================================
// Auth Config Definition
// ============================================================================

/// Authentication section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfigDef {
    /// No authentication
    #[default]
    None,

    /// A bearer token obtained elsewhere
    Bearer {
        /// The token value
        token: String,
    },

    /// Signed JWT client credentials
    Jwt(JwtAuthConfig),
}

/// Signed JWT client credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtAuthConfig {
    /// Auth base URL; the token endpoint is `{base_url}/oauth2/token`
    pub base_url: String,

    /// Application client id
    pub client_id: String,

    /// Key identifier
    pub kid: String,

    /// Inline PEM private key
    #[serde(default)]
    pub private_key: Option<String>,

    /// Path to a PEM private key
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Environment variable holding a PEM private key
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Signing algorithm (RS512 when omitted)
    #[serde(default)]
    pub algorithm: Option<JwtAlgorithm>,
}

impl JwtAuthConfig {
    /// Resolve key sources into a [`ClientIdentity`]
    ///
    /// An inline key wins over the environment variable.
    pub fn to_identity(&self) -> Result<ClientIdentity> {
        let mut identity = ClientIdentity::new(&self.base_url, &self.client_id, &self.kid);
        identity.algorithm = self.algorithm;
        identity.private_key_file = self.private_key_file.clone();

        if let Some(pem) = self.private_key.clone().none_if_empty() {
            identity.private_key = Some(pem.into_bytes());
        } else if let Some(var) = self.private_key_env.as_deref() {
            let pem = std::env::var(var).map_err(|_| {
                Error::config(format!("Environment variable '{var}' is not set"))
            })?;
            identity.private_key = Some(pem.into_bytes());
        }

        Ok(identity)
    }
}
