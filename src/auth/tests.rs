//! Tests for the auth module

use super::*;
use crate::error::{Error, ErrorCategory, UrlError};
use crate::http::{Context, Transport};
use crate::types::JwtAlgorithm;
use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIVATE_KEY: &[u8] = include_bytes!("../../tests/fixtures/private_key.pem");
const PUBLIC_KEY: &[u8] = include_bytes!("../../tests/fixtures/public_key.pem");

fn identity(base_url: &str) -> ClientIdentity {
    ClientIdentity::new(base_url, "c1", "k1").with_private_key(PRIVATE_KEY)
}

fn manager(server: &MockServer) -> TokenManager {
    TokenManager::new(
        identity(&server.uri()),
        Transport::new().unwrap(),
        "nhs-fhir-test",
    )
    .unwrap()
}

fn token_body(access_token: &str, expires_in: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "Bearer",
        "issued_at": Utc::now().timestamp_millis().to_string()
    })
}

fn client_assertion(request: &wiremock::Request) -> String {
    url::form_urlencoded::parse(&request.body)
        .find(|(k, _)| k == "client_assertion")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

fn verify(jwt: &str, audience: &str) -> AssertionClaims {
    let mut validation = Validation::new(Algorithm::RS512);
    validation.set_audience(&[audience]);
    decode::<AssertionClaims>(jwt, &DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap(), &validation)
        .unwrap()
        .claims
}

// ============================================================================
// Identity validation
// ============================================================================

#[test_case(ClientIdentity::default(), Error::BaseUrlMissing ; "everything missing reports base url first")]
#[test_case(ClientIdentity::new("   ", "c1", "k1").with_private_key(PRIVATE_KEY), Error::BaseUrlMissing ; "blank base url")]
#[test_case(ClientIdentity::new("not a url", "", ""), Error::InvalidUrl(UrlError::SchemeMissing) ; "relative base url")]
#[test_case(
    ClientIdentity::new("https://example.org", "", "")
        .with_private_key(Vec::new())
        .with_private_key_file("abc.pem"),
    Error::KidMissing ; "kid before client id"
)]
#[test_case(ClientIdentity::new("https://example.org", "", "k1"), Error::ClientIdMissing ; "client id before key")]
#[test_case(ClientIdentity::new("https://example.org", "c1", "   ").with_private_key(PRIVATE_KEY), Error::KidMissing ; "blank kid")]
#[test_case(ClientIdentity::new("https://example.org", " \t", "k1").with_private_key(PRIVATE_KEY), Error::ClientIdMissing ; "blank client id")]
#[test_case(ClientIdentity::new("https://example.org", "c1", "k1"), Error::KeyMissing ; "no key source")]
#[test_case(ClientIdentity::new("https://example.org", "c1", "k1").with_private_key(Vec::new()), Error::KeyMissing ; "empty key bytes")]
#[test_case(identity("https://example.org").with_algorithm(JwtAlgorithm::HS256), Error::InvalidSigningAlgorithm(JwtAlgorithm::HS256) ; "hmac rejected")]
#[test_case(identity("https://example.org").with_algorithm(JwtAlgorithm::ES256), Error::InvalidSigningAlgorithm(JwtAlgorithm::ES256) ; "ecdsa rejected")]
fn test_identity_validation_order(identity: ClientIdentity, expected: Error) {
    let err = identity.validate().unwrap_err();
    assert_eq!(
        std::mem::discriminant(&err),
        std::mem::discriminant(&expected),
        "got {err:?}, want {expected:?}"
    );
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test_case(None ; "default algorithm")]
#[test_case(Some(JwtAlgorithm::RS256) ; "rs256")]
#[test_case(Some(JwtAlgorithm::PS512) ; "ps512")]
fn test_identity_valid(algorithm: Option<JwtAlgorithm>) {
    let mut identity = identity("https://example.org");
    identity.algorithm = algorithm;
    assert!(identity.validate().is_ok());
}

#[test]
fn test_identity_with_only_a_signer_is_valid() {
    let identity =
        ClientIdentity::new("https://example.org", "c1", "k1").with_signer(Arc::new(RsaSigner));
    assert!(identity.validate().is_ok());
}

// ============================================================================
// Assertion minting
// ============================================================================

#[test]
fn test_mint_assertion() {
    let now = Utc::now();
    let jwt = mint_assertion_at(&identity("https://example.org"), now).unwrap();

    let header = decode_header(&jwt).unwrap();
    assert_eq!(header.alg, Algorithm::RS512);
    assert_eq!(header.kid.as_deref(), Some("k1"));

    let claims = verify(&jwt, "https://example.org/oauth2/token");
    assert_eq!(claims.iss, "c1");
    assert_eq!(claims.sub, "c1");
    assert_eq!(claims.aud, "https://example.org/oauth2/token");
    assert_eq!(claims.exp, now.timestamp() + ASSERTION_LIFETIME_SECS);
    assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
}

#[test]
fn test_mint_assertion_unique_jti() {
    let identity = identity("https://example.org");
    let a = verify(&mint_assertion(&identity).unwrap(), "https://example.org/oauth2/token");
    let b = verify(&mint_assertion(&identity).unwrap(), "https://example.org/oauth2/token");
    assert_ne!(a.jti, b.jti);
}

#[test]
fn test_mint_assertion_algorithm_override() {
    let identity = identity("https://example.org").with_algorithm(JwtAlgorithm::RS256);
    let jwt = mint_assertion(&identity).unwrap();
    assert_eq!(decode_header(&jwt).unwrap().alg, Algorithm::RS256);
}

#[test]
fn test_mint_assertion_from_key_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PRIVATE_KEY).unwrap();

    let identity =
        ClientIdentity::new("https://example.org", "c1", "k1").with_private_key_file(file.path());
    let jwt = mint_assertion(&identity).unwrap();
    assert_eq!(verify(&jwt, "https://example.org/oauth2/token").iss, "c1");
}

#[test]
fn test_raw_key_preferred_over_file() {
    let identity = identity("https://example.org").with_private_key_file("/does/not/exist.pem");
    assert!(mint_assertion(&identity).is_ok());
}

#[test]
fn test_unreadable_key_file() {
    let identity = ClientIdentity::new("https://example.org", "c1", "k1")
        .with_private_key_file("/does/not/exist.pem");
    let err = mint_assertion(&identity).unwrap_err();

    assert!(matches!(err, Error::KeyRead { .. }));
    assert_eq!(err.category(), ErrorCategory::Signing);
    assert!(err.to_string().contains("/does/not/exist.pem"));
}

#[test]
fn test_unparseable_key() {
    let identity = ClientIdentity::new("https://example.org", "c1", "k1")
        .with_private_key(b"not a pem".to_vec());
    let err = mint_assertion(&identity).unwrap_err();
    assert!(matches!(err, Error::KeyParse(_)));
}

#[test]
fn test_mint_validates_first() {
    let identity = ClientIdentity::new("https://example.org", "c1", "").with_private_key(PRIVATE_KEY);
    assert!(matches!(mint_assertion(&identity), Err(Error::KidMissing)));
}

#[derive(Default)]
struct RecordingSigner {
    seen: Mutex<Option<(UnsignedToken, Option<Vec<u8>>)>>,
}

impl Signer for RecordingSigner {
    fn sign(&self, token: &UnsignedToken, key: Option<&[u8]>) -> crate::Result<String> {
        *self.seen.lock().unwrap() = Some((token.clone(), key.map(<[u8]>::to_vec)));
        Ok(format!("{}.c2lnbmVk", token.signing_input()?))
    }
}

#[test]
fn test_custom_signer_receives_token() {
    let signer = Arc::new(RecordingSigner::default());
    let identity =
        ClientIdentity::new("https://example.org", "c1", "k1").with_signer(signer.clone());

    let jwt = mint_assertion(&identity).unwrap();
    assert!(jwt.ends_with(".c2lnbmVk"));

    let (token, key) = signer.seen.lock().unwrap().take().unwrap();
    assert_eq!(token.header.kid.as_deref(), Some("k1"));
    assert_eq!(token.claims.iss, "c1");
    assert!(key.is_none());

    // the header segment decodes like any other JWT
    assert_eq!(decode_header(&jwt).unwrap().kid.as_deref(), Some("k1"));
}

#[test]
fn test_custom_signer_gets_configured_key() {
    let signer = Arc::new(RecordingSigner::default());
    let identity = identity("https://example.org").with_signer(signer.clone());

    mint_assertion(&identity).unwrap();

    let (_, key) = signer.seen.lock().unwrap().take().unwrap();
    assert_eq!(key.as_deref(), Some(PRIVATE_KEY));
}

struct FailingSigner;

impl Signer for FailingSigner {
    fn sign(&self, _token: &UnsignedToken, _key: Option<&[u8]>) -> crate::Result<String> {
        Err(Error::signing("hsm offline"))
    }
}

#[test]
fn test_custom_signer_error_propagates() {
    let identity = ClientIdentity::new("https://example.org", "c1", "k1")
        .with_signer(Arc::new(FailingSigner));
    let err = mint_assertion(&identity).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Signing);
    assert!(err.to_string().contains("hsm offline"));
}

// ============================================================================
// Token manager
// ============================================================================

#[test]
fn test_manager_rejects_invalid_identity() {
    let result = TokenManager::new(
        ClientIdentity::new("https://example.org", "c1", ""),
        Transport::new().unwrap(),
        "ua",
    );
    assert!(matches!(result, Err(Error::KidMissing)));
}

#[tokio::test]
async fn test_token_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains(
            "client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("client_assertion=ey"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("Sr5PGv19wTEHJdDr2wx2f7IGd0cw", "599")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    let token = manager.access_token(&Context::background()).await.unwrap();
    assert_eq!(token, "Sr5PGv19wTEHJdDr2wx2f7IGd0cw");

    let cached = manager.cached_token().await.unwrap();
    assert_eq!(cached.expires_in, 599);
    assert_eq!(cached.token_type, "Bearer");

    // assertion audience is the token endpoint
    let requests = mock_server.received_requests().await.unwrap();
    let claims = verify(&client_assertion(&requests[0]), manager.token_url().as_str());
    assert_eq!(claims.iss, "c1");
}

#[tokio::test]
async fn test_token_caching() {
    let mock_server = MockServer::start().await;

    // only called once, later calls hit the cache
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cached-token", "3600")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    let ctx = Context::background();
    for _ in 0..3 {
        assert_eq!(manager.access_token(&ctx).await.unwrap(), "cached-token");
    }
}

#[tokio::test]
async fn test_expired_token_is_renewed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh-token", "600")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    manager
        .seed_token(AccessToken {
            access_token: "stale-token".to_string(),
            token_type: "Bearer".to_string(),
            issued_at: Utc::now().timestamp_millis() - 120_000,
            expires_in: 60,
        })
        .await;

    let token = manager.access_token(&Context::background()).await.unwrap();
    assert_eq!(token, "fresh-token");
}

#[tokio::test]
async fn test_assertion_reused_across_renewals() {
    let mock_server = MockServer::start().await;

    // zero lifetime: every call renews
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short-lived", "0")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    let ctx = Context::background();
    manager.access_token(&ctx).await.unwrap();
    manager.access_token(&ctx).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(client_assertion(&requests[0]), client_assertion(&requests[1]));
}

#[tokio::test]
async fn test_clear_cache_mints_new_assertion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("token", "3600")))
        .expect(2) // cache cleared in between
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    let ctx = Context::background();
    manager.access_token(&ctx).await.unwrap();
    manager.clear_cache().await;
    assert!(manager.cached_token().await.is_none());
    manager.access_token(&ctx).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_ne!(client_assertion(&requests[0]), client_assertion(&requests[1]));
}

#[tokio::test]
async fn test_token_failure_is_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed"
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("second-try", "3600")))
        .mount(&mock_server)
        .await;

    let manager = manager(&mock_server);
    let ctx = Context::background();

    let err = manager.access_token(&ctx).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("401"));
    assert!(manager.cached_token().await.is_none());

    assert_eq!(manager.access_token(&ctx).await.unwrap(), "second-try");
}

#[tokio::test]
async fn test_token_endpoint_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&mock_server)
        .await;

    let err = manager(&mock_server)
        .access_token(&Context::background())
        .await
        .unwrap_err();

    match err {
        Error::RateLimitExceeded {
            retry_after_seconds,
            ..
        } => assert_eq!(retry_after_seconds, Some(30)),
        other => panic!("expected rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_callers_share_one_renewal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("shared-token", "3600"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = Arc::new(manager(&mock_server));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.access_token(&Context::background()).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "shared-token");
    }
}

#[tokio::test]
async fn test_cancelled_context_skips_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("never", "3600")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = Context::background();
    ctx.cancel();

    let err = manager(&mock_server).access_token(&ctx).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_static_token_provider() {
    let provider: Arc<dyn TokenProvider> = Arc::new(StaticToken::new("fixed"));
    let token = provider.access_token(&Context::background()).await.unwrap();
    assert_eq!(token, "fixed");
    assert!(!format!("{:?}", StaticToken::new("fixed")).contains("fixed"));
}
