//! `application/x-www-form-urlencoded` encoding.
//!
//! [`QueryParams`] is an ordered multi-value map used both for URL query
//! strings and for form bodies. Keys are kept sorted so that encoding is
//! deterministic: `a=1&b=2&b=3`.

use std::collections::BTreeMap;
use std::collections::btree_map;
use url::form_urlencoded;

/// Content type of form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type of JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Multi-value key/value map with form-urlencoded serialization.
///
/// ```rust
/// use vantuz_core::encoding::QueryParams;
///
/// let mut params = QueryParams::new();
/// params.add("tag", "a b").add("tag", "c&d").set("page", "2");
/// assert_eq!(params.encode(), "page=2&tag=a+b&tag=c%26d");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to `key`, keeping any existing ones.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), vec![value.into()]);
        self
    }

    /// Removes `key` entirely.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.values.remove(key)
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map_or(&[][..], Vec::as_slice)
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates keys in sorted order with their values.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.values.iter()
    }

    /// Serializes as `k=v1&k=v2&...` with keys sorted.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.values {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Parses a form-urlencoded string. Repeated keys accumulate.
    pub fn parse(input: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            params.add(key, value);
        }
        params
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.add(key, value);
        }
        params
    }
}

impl<K, V> Extend<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl From<BTreeMap<String, Vec<String>>> for QueryParams {
    fn from(values: BTreeMap<String, Vec<String>>) -> Self {
        Self { values }
    }
}
