//! `Content-Type` parsing
//!
//! Splits a header value into its five facets following
//! `type "/" [tree "."] subtype ["+" suffix] [";" params]`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Structured view of a `Content-Type` value
///
/// Every facet is independently optional. A header that is empty or does not
/// match the grammar yields a value with all facets absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MimeType {
    type_name: Option<String>,
    tree: Option<String>,
    subtype: Option<String>,
    suffix: Option<String>,
    params: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl MimeType {
    /// Parse a raw header value; never fails
    pub fn parse(header: &str) -> Self {
        Self::try_parse(&header.trim().to_lowercase()).unwrap_or_default()
    }

    fn try_parse(input: &str) -> Option<Self> {
        let (type_name, rest) = input.split_once('/')?;
        let type_name = non_empty(type_name)?;

        let (facets, params) = match rest.split_once(';') {
            Some((facets, params)) => (facets, non_empty(params)),
            None => (rest, None),
        };

        let (subtype, suffix) = match facets.split_once('+') {
            Some((subtype, suffix)) => (subtype, non_empty(suffix)),
            None => (facets, None),
        };

        let (tree, subtype) = match subtype.split_once('.') {
            Some((tree, subtype)) => (non_empty(tree), subtype),
            None => (None, subtype),
        };

        Some(Self {
            type_name: Some(type_name),
            tree,
            subtype: Some(non_empty(subtype)?),
            suffix,
            params,
        })
    }

    /// Top-level type, e.g. `application`
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Registration tree, e.g. `vnd`
    pub fn tree(&self) -> Option<&str> {
        self.tree.as_deref()
    }

    /// Subtype without tree and suffix, e.g. `api`
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Structured syntax suffix, e.g. `json`
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Everything after the first `;`, kept as one opaque string
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// `type/subtype` when both are known
    pub fn essence(&self) -> Option<String> {
        match (self.type_name(), self.subtype()) {
            (Some(t), Some(s)) => Some(format!("{t}/{s}")),
            _ => None,
        }
    }

    /// Whether no facet was parsed
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl FromStr for MimeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(type_name), Some(subtype)) = (self.type_name(), self.subtype()) else {
            return Ok(());
        };
        write!(f, "{type_name}/")?;
        if let Some(tree) = self.tree() {
            write!(f, "{tree}.")?;
        }
        f.write_str(subtype)?;
        if let Some(suffix) = self.suffix() {
            write!(f, "+{suffix}")?;
        }
        if let Some(params) = self.params() {
            write!(f, "; {params}")?;
        }
        Ok(())
    }
}
