//! Session cookies returned by the SharePoint sign-in endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered mapping of cookie name to raw `name=value` cookie string.
///
/// Order is insertion order, which is also the order used when the cookies
/// are serialized into a `Cookie` request header.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookies(Vec<(String, String)>);

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cookie, replacing any existing entry with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, cookie: impl Into<String>) {
        let name = name.into();
        let cookie = cookie.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = cookie,
            None => self.0.push((name, cookie)),
        }
    }

    /// Raw cookie string for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether every name in `names` is present.
    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.contains(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    /// Value for a `Cookie` request header.
    pub fn header_value(&self) -> String {
        self.0
            .iter()
            .map(|(_, c)| c.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// Cookie values are session secrets; only names are printed.
impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
