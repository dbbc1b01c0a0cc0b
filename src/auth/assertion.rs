//! Client assertion minting
//!
//! The assertion is a short-lived JWT identifying the application to the
//! token endpoint. Header carries `kid`; claims are `iss`/`sub` (client id),
//! `aud` (token URL), a random `jti` and `exp` five minutes out.

use super::types::ClientIdentity;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Assertion lifetime in seconds
pub const ASSERTION_LIFETIME_SECS: i64 = 300;

/// Registered claims of a client assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub jti: String,
    pub exp: i64,
}

/// Header and claims waiting to be signed
#[derive(Debug, Clone)]
pub struct UnsignedToken {
    pub header: Header,
    pub claims: AssertionClaims,
}

impl UnsignedToken {
    /// `base64url(header) "." base64url(claims)`, the bytes a signer signs
    pub fn signing_input(&self) -> Result<String> {
        let header = serde_json::to_vec(&self.header).map_err(Error::Encode)?;
        let claims = serde_json::to_vec(&self.claims).map_err(Error::Encode)?;
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        ))
    }
}

/// Produces a compact JWS from an unsigned token
///
/// `key` is the configured PEM material, if any. Implementations backed by
/// external key stores may ignore it.
pub trait Signer: Send + Sync {
    fn sign(&self, token: &UnsignedToken, key: Option<&[u8]>) -> Result<String>;
}

impl fmt::Debug for dyn Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Signer")
    }
}

/// Built-in signer for PEM-encoded RSA keys
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaSigner;

impl Signer for RsaSigner {
    fn sign(&self, token: &UnsignedToken, key: Option<&[u8]>) -> Result<String> {
        let pem = key.ok_or(Error::KeyMissing)?;
        let encoding_key = EncodingKey::from_rsa_pem(pem).map_err(Error::KeyParse)?;
        jsonwebtoken::encode(&token.header, &token.claims, &encoding_key)
            .map_err(|e| Error::signing(e.to_string()))
    }
}

/// Mint a signed client assertion valid for five minutes from now
pub fn mint_assertion(identity: &ClientIdentity) -> Result<String> {
    mint_assertion_at(identity, Utc::now())
}

/// Mint a signed client assertion with `now` as the reference time
pub fn mint_assertion_at(identity: &ClientIdentity, now: DateTime<Utc>) -> Result<String> {
    identity.validate()?;

    let token = unsigned_assertion(identity, now)?;
    let key = load_key(identity)?;

    debug!(
        "Minting client assertion for {} (kid {})",
        identity.client_id, identity.kid
    );

    match &identity.signer {
        Some(signer) => signer.sign(&token, key.as_deref()),
        None => RsaSigner.sign(&token, key.as_deref()),
    }
}

fn unsigned_assertion(identity: &ClientIdentity, now: DateTime<Utc>) -> Result<UnsignedToken> {
    let claims = AssertionClaims {
        iss: identity.client_id.clone(),
        sub: identity.client_id.clone(),
        aud: identity.token_url()?.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(identity.algorithm.unwrap_or_default().into());
    header.kid = Some(identity.kid.clone());

    Ok(UnsignedToken { header, claims })
}

/// Raw key bytes win over the key file
fn load_key(identity: &ClientIdentity) -> Result<Option<Vec<u8>>> {
    if let Some(pem) = identity.private_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(Some(pem.clone()));
    }

    match identity
        .private_key_file
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty())
    {
        Some(path) => std::fs::read(path)
            .map(Some)
            .map_err(|source| Error::KeyRead {
                path: path.clone(),
                source,
            }),
        None => Ok(None),
    }
}
