// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # NHS PDS FHIR client
//!
//! Async client for the NHS Personal Demographics Service FHIR API.
//!
//! ## Features
//!
//! - **Patient lookup**: retrieve by NHS number, search by demographics
//! - **Signed JWT auth**: client assertions exchanged for cached access tokens
//! - **Cancellation**: every call takes a [`Context`] with an optional deadline
//! - **Classified errors**: rate limits, status and decode failures are distinct
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nhs_fhir::auth::ClientIdentity;
//! use nhs_fhir::patient::PatientSearchOptions;
//! use nhs_fhir::{Client, Context, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://int.api.service.nhs.uk/personal-demographics/FHIR/R4/")
//!         .jwt_auth(
//!             ClientIdentity::new("https://int.api.service.nhs.uk", "my-client-id", "test-1")
//!                 .with_private_key_file("keys/private.pem"),
//!         )
//!         .build()?;
//!
//!     let ctx = Context::with_timeout(std::time::Duration::from_secs(30));
//!
//!     let patient = client.patient().get(&ctx, "9000000009").await?;
//!
//!     let matches = client
//!         .patient()
//!         .search(&ctx, &PatientSearchOptions::new().family("Smith").given("Jane"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  PatientService (get / search)                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │          Client::new_request  →  Transport::execute             │
//! │  base URL, user agent,           context race, 429 / status /   │
//! │  X-Request-ID, bearer            decode classification          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────┬───────────┴───────────┬──────────────────────┐
//! │   TokenManager   │   Assertion minting   │      Validation      │
//! ├──────────────────┼───────────────────────┼──────────────────────┤
//! │ token cache      │ RS512 + kid           │ absolute URLs        │
//! │ single renewal   │ custom signers        │ NHS numbers          │
//! └──────────────────┴───────────────────────┴──────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types
pub mod types;

/// URL and NHS number validation
pub mod validation;

/// Query string encoding
pub mod query;

/// Signed JWT authentication and token caching
pub mod auth;

/// Request construction and transport
pub mod http;

/// The PDS client
pub mod client;

/// Patient operations and resource model
pub mod patient;

/// Client configuration files
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorCategory, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use config::ClientConfig;
pub use http::{Context, Response};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
