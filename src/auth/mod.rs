//! Authentication module
//!
//! Signed JWT client-credentials flow:
//!
//! 1. Mint a client assertion (RS512 by default) with the application's key
//! 2. Exchange it at `{auth base}/oauth2/token` for an access token
//! 3. Cache the access token until it expires
//!
//! [`TokenManager`] does all three; [`StaticToken`] serves a token obtained
//! some other way.

mod assertion;
mod manager;
mod types;

pub use assertion::{
    mint_assertion, mint_assertion_at, AssertionClaims, RsaSigner, Signer, UnsignedToken,
    ASSERTION_LIFETIME_SECS,
};
pub use manager::{StaticToken, TokenManager, TokenProvider, CLIENT_ASSERTION_TYPE, GRANT_TYPE};
pub use types::{AccessToken, ClientIdentity, TOKEN_PATH};

#[cfg(test)]
mod tests;
