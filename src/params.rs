//! Route parameters and query strings.
//!
//! [`RouteParams`] is the opaque payload given to `navigate_to`, and also what
//! the route table captures from `:name` segments when it resolves a path.
//! [`QueryParams`] holds the `?key=value` tail of an internal link and keeps
//! repeated keys.
//!
//! Both are ordered maps, so serialising them gives the same text every time.
//!
//! ```
//! use villa_navigator::{QueryParams, RouteParams};
//!
//! let params = RouteParams::from_pairs([("bookingId", "42")]);
//! assert_eq!(params.get_as::<u32>("bookingId"), Some(42));
//! assert_eq!(params.fill_pattern("/bookings/:bookingId").unwrap(), "/bookings/42");
//!
//! let query = QueryParams::from_query_string("tab=payout&page=2");
//! assert_eq!(query.get_as::<u32>("page"), Some(2));
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

/// String parameters for one route, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RouteParams {
    values: BTreeMap<String, String>,
}

impl RouteParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs. Later pairs overwrite earlier ones.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Get a captured or supplied value by name.
    pub fn get(&self, name: &str) -> Option<&String> {
        self.values.get(name)
    }

    /// Parse the value of `name`; `None` when absent or unparsable.
    ///
    /// ```
    /// use villa_navigator::RouteParams;
    ///
    /// let params = RouteParams::from_pairs([("nights", "3"), ("guest", "Ana")]);
    /// assert_eq!(params.get_as::<u8>("nights"), Some(3));
    /// assert_eq!(params.get_as::<u8>("guest"), None);
    /// ```
    pub fn get_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.values.get(name)?.parse().ok()
    }

    /// Set `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Return `true` if `name` has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    /// Return `true` when there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Union of both sets; `overrides` wins where a name appears twice.
    pub fn merge(base: &RouteParams, overrides: &RouteParams) -> RouteParams {
        let mut merged = base.clone();
        merged.values.extend(
            overrides
                .values
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        merged
    }

    /// Substitute the `:name` segments of `pattern`, percent-encoding values.
    ///
    /// On failure returns the first name without a value.
    ///
    /// ```
    /// use villa_navigator::RouteParams;
    ///
    /// let params = RouteParams::from_pairs([("villaId", "7")]);
    /// assert_eq!(params.fill_pattern("/villas/:villaId/edit").unwrap(), "/villas/7/edit");
    /// assert_eq!(RouteParams::new().fill_pattern("/villas/:villaId"), Err("villaId".to_string()));
    /// ```
    pub fn fill_pattern(&self, pattern: &str) -> Result<String, String> {
        let mut filled = String::with_capacity(pattern.len());
        for segment in segments(pattern) {
            filled.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    let value = self.get(name).ok_or_else(|| name.to_string())?;
                    filled.push_str(&encode_component(value));
                }
                None => filled.push_str(segment),
            }
        }
        if filled.is_empty() {
            filled.push('/');
        }
        Ok(filled)
    }

    /// Capture the `:name` segments of `pattern` from `path`.
    ///
    /// `None` when the literal segments or the segment count differ.
    ///
    /// ```
    /// use villa_navigator::RouteParams;
    ///
    /// let params = RouteParams::from_path("/bookings/42", "/bookings/:bookingId").unwrap();
    /// assert_eq!(params.get("bookingId").map(String::as_str), Some("42"));
    /// assert!(RouteParams::from_path("/villas/1", "/bookings/:bookingId").is_none());
    /// ```
    pub fn from_path(path: &str, pattern: &str) -> Option<RouteParams> {
        let mut actual = segments(path);
        let mut captured = RouteParams::new();
        for expected in segments(pattern) {
            let segment = actual.next()?;
            match expected.strip_prefix(':') {
                Some(name) => {
                    captured.insert(name, decode_component(segment));
                }
                None if expected == segment => {}
                None => return None,
            }
        }
        actual.next().is_none().then_some(captured)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Parsed query string. A key may carry several values, kept in order.
///
/// ```
/// use villa_navigator::QueryParams;
///
/// let query = QueryParams::from_query_string("page=1&amenity=pool&amenity=garden");
/// assert_eq!(query.get("page").map(String::as_str), Some("1"));
/// assert_eq!(query.get_all("amenity"), ["pool", "garden"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2`. A leading `?` is ignored and a bare `flag` gets an
    /// empty value.
    pub fn from_query_string(query: &str) -> Self {
        let mut parsed = Self::new();
        for pair in query.trim_start_matches('?').split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            parsed.append(decode_component(key), decode_component(value));
        }
        parsed
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)?.first()
    }

    /// Every value of `key`; empty when absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map_or(&[], Vec::as_slice)
    }

    /// Get a value parsed as `T`. `None` when missing or unparsable.
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    /// Add another value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Return `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` when the query has no pairs.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode back to `a=1&b=2`, keys sorted, repeated values in order.
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.values {
            for value in values {
                if !out.is_empty() {
                    out.push('&');
                }
                out.push_str(&encode_component(key));
                out.push('=');
                out.push_str(&encode_component(value));
            }
        }
        out
    }

    /// First value of every key, as route parameters.
    pub fn to_route_params(&self) -> RouteParams {
        self.values
            .iter()
            .filter_map(|(key, values)| Some((key.as_str(), values.first()?.as_str())))
            .collect()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Percent-encode every byte outside the RFC 3986 unreserved set.
pub(crate) fn encode_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Reverse of [`encode_component`]; `+` reads as a space and malformed
/// escapes are kept literally.
pub(crate) fn decode_component(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => match encoded.get(i + 1..i + 3).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                Some(byte) => {
                    decoded.push(byte);
                    i += 3;
                    continue;
                }
                None => decoded.push(b'%'),
            },
            b'+' => decoded.push(b' '),
            other => decoded.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
