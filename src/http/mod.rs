//! HTTP module
//!
//! Request construction and the transport executor.
//!
//! # Features
//!
//! - **Standard headers**: JSON accept/content type, user agent, unique request id
//! - **Cancellation**: every call is bound to a [`Context`]
//! - **Error classification**: rate limits, status errors and decode errors are distinct
//! - **Response metadata**: status, headers and request id travel with the payload

mod context;
mod request;
mod response;
mod transport;

pub use context::Context;
pub use request::{
    form_request, new_request_id, request_id, OutboundRequest, JSON_CONTENT_TYPE,
    REQUEST_ID_HEADER,
};
pub use response::Response;
pub use transport::{Transport, TransportConfig};
