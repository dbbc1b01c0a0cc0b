//! Response metadata returned alongside decoded payloads

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

/// Status, headers and correlating request id of an API response
///
/// The request id is the `X-Request-ID` sent with the request; quote it when
/// raising support queries with the API provider.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    request_id: String,
}

impl Response {
    pub(crate) fn new(response: &reqwest::Response, request_id: String) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            request_id,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL of the response
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The `X-Request-ID` sent with the request
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
