//! Configured headers and their injection into outgoing requests.
//!
//! # Design
//! The client owns one `HeaderSet` for its lifetime. `inject` copies the set
//! onto each request right before dispatch, overriding any same-named header
//! (ignoring case) the request already carries. Per-call headers are placed
//! on the request first, so on a collision the configured value wins.
//! Because `inject` copies, changing the set afterwards never reaches a
//! request that was already built.

use crate::http::{HeaderMap, HttpRequest};

/// Headers applied to every request a client sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    headers: HeaderMap,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for HeaderSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.headers.extend(iter);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            headers: iter.into_iter().collect(),
        }
    }
}

/// Return `request` with every header from `set` applied over its own.
pub fn inject(mut request: HttpRequest, set: &HeaderSet) -> HttpRequest {
    for (name, value) in set.iter() {
        request.headers.insert(name, value);
    }
    request
}
