//! Query string encoding
//!
//! Parameters are emitted sorted by key. The sort is stable, so repeated
//! keys keep the order they were added in:
//!
//! ```
//! use nhs_fhir::query::{add_params_to_url, Query};
//!
//! let query = Query::new().push("foo", "abc").push("bar", "kazoo");
//! assert_eq!(add_params_to_url("people", &query), "people?bar=kazoo&foo=abc");
//! ```

use std::fmt::Display;
use url::form_urlencoded;

/// Ordered list of query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    #[must_use]
    pub fn push(mut self, key: &str, value: impl Display) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a parameter only when `value` is present
    #[must_use]
    pub fn push_opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    /// Add one parameter per value under the same key
    #[must_use]
    pub fn push_all<I>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        values.into_iter().fold(self, |q, v| q.push(key, v))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Parameters in insertion order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// URL-encode, sorted by key
    pub fn encode(&self) -> String {
        let mut sorted: Vec<&(String, String)> = self.pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(sorted.into_iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Types that can be rendered as query parameters
pub trait ToQuery {
    fn to_query(&self) -> Query;
}

impl ToQuery for Query {
    fn to_query(&self) -> Query {
        self.clone()
    }
}

impl<T: ToQuery + ?Sized> ToQuery for &T {
    fn to_query(&self) -> Query {
        (**self).to_query()
    }
}

/// `None` adds nothing
impl<T: ToQuery> ToQuery for Option<T> {
    fn to_query(&self) -> Query {
        self.as_ref().map(ToQuery::to_query).unwrap_or_default()
    }
}

/// Append `params` to `path`, replacing any existing query string
///
/// Returns `path` untouched when there are no parameters. The result is a
/// relative reference; it is resolved against the client base URL when the
/// request is built, which is where malformed paths get reported.
pub fn add_params_to_url(path: &str, params: &impl ToQuery) -> String {
    let query = params.to_query();
    if query.is_empty() {
        return path.to_string();
    }
    let base = path.split_once('?').map_or(path, |(p, _)| p);
    format!("{base}?{}", query.encode())
}
