//! Path templates
//!
//! A template such as `/item/:item_id.json` is resolved against a [`Params`]
//! map. Every `:name` placeholder is substituted from the map; whatever the
//! template does not consume becomes the query string, in insertion order.
//!
//! Values are percent-encoded with the RFC 3986 unreserved set, in the path
//! and in the query alike, so a space is always `%20` and never `+`.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::error::HttpError;
use crate::map::Params;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":[A-Za-z_][A-Za-z0-9_]*").expect("Valid placeholder pattern"));

/// Everything outside `ALPHA / DIGIT / "-" / "." / "_" / "~"`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single path segment or query component
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// A template resolved into a path and its leftover query pairs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedUri {
    /// Path with every placeholder substituted
    pub path: String,
    /// Encoded `(key, value)` pairs, in parameter insertion order
    pub query: Vec<(String, String)>,
}

impl ResolvedUri {
    /// Query pairs joined with `&` and `=`, without a leading `?`
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for ResolvedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        Ok(())
    }
}

/// Resolve `template` against `params`
///
/// Fails with [`HttpError::MissingParameter`] when a placeholder has no
/// matching key. A name used several times consumes its parameter once.
pub fn resolve(template: &str, params: &Params) -> Result<ResolvedUri, HttpError> {
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut path = String::with_capacity(template.len());
    let mut cursor = 0;

    for token in PLACEHOLDER.find_iter(template) {
        let name = &token.as_str()[1..];
        let value = params
            .get(name)
            .ok_or_else(|| HttpError::MissingParameter(name.to_string()))?;

        path.push_str(&template[cursor..token.start()]);
        path.push_str(&encode_component(&value.to_string()));
        cursor = token.end();
        consumed.insert(name);
    }
    path.push_str(&template[cursor..]);

    let query = params
        .iter()
        .filter(|(key, _)| !consumed.contains(key))
        .map(|(key, value)| (encode_component(key), encode_component(&value.to_string())))
        .collect();

    Ok(ResolvedUri { path, query })
}
