//! Response envelope

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::decode;
use crate::error::Response;
use crate::map::{Info, OrderedMap};
use crate::mime::MimeType;
use crate::value::Scalar;

/// Info key holding the effective HTTP status code
pub const INFO_HTTP_CODE: &str = "http_code";
/// Info key holding the effective request URL
pub const INFO_URL: &str = "url";

/// Immutable bundle of a response's metadata, headers and body
///
/// Built once when the response arrives. Every accessor is a pure read, and
/// body decoding is recomputed on each call.
#[derive(Debug, Clone)]
pub struct Envelope {
    id: String,
    info: Info,
    headers: OrderedMap<String>,
    payload: Option<Vec<u8>>,
    mime: MimeType,
}

/// A single facet of the request URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPart {
    /// `https`
    Scheme,
    /// `api.example.com`
    Host,
    /// Explicit port, or the scheme's default
    Port,
    /// `/item/1234.json`
    Path,
    /// `sort=name`
    Query,
    /// Text after `#`
    Fragment,
    /// Username from the authority
    User,
}

/// Decomposed request URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// Scheme
    pub scheme: String,
    /// Host
    pub host: Option<String>,
    /// Port
    pub port: Option<u16>,
    /// Path
    pub path: String,
    /// Query without `?`
    pub query: Option<String>,
    /// Fragment without `#`
    pub fragment: Option<String>,
    /// Username
    pub user: Option<String>,
}

impl UrlParts {
    /// Select one facet
    pub fn get(&self, part: UrlPart) -> Option<Scalar> {
        match part {
            UrlPart::Scheme => Some(self.scheme.as_str().into()),
            UrlPart::Host => self.host.as_deref().map(Scalar::from),
            UrlPart::Port => self.port.map(Scalar::from),
            UrlPart::Path => Some(self.path.as_str().into()),
            UrlPart::Query => self.query.as_deref().map(Scalar::from),
            UrlPart::Fragment => self.fragment.as_deref().map(Scalar::from),
            UrlPart::User => self.user.as_deref().map(Scalar::from),
        }
    }
}

impl From<&Url> for UrlParts {
    fn from(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().map(str::to_string),
            port: url.port_or_known_default(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
            user: (!url.username().is_empty()).then(|| url.username().to_string()),
        }
    }
}

impl Envelope {
    /// Create an envelope from transport output
    ///
    /// Header names are lower-cased; on duplicates the last value wins.
    pub fn new<I, K, V>(
        id: impl Into<String>,
        info: Info,
        headers: I,
        payload: Option<Vec<u8>>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers: OrderedMap<String> = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        let mime = headers
            .get("content-type")
            .map(|value| MimeType::parse(value))
            .unwrap_or_default();

        Self {
            id: id.into(),
            info,
            headers,
            payload,
            mime,
        }
    }

    /// Transport-assigned request identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Leading `digits` of the status code (clamped to 1..=3), `0` when unknown
    pub fn status(&self, digits: usize) -> u16 {
        let code = self
            .info(INFO_HTTP_CODE)
            .map(Scalar::to_string)
            .unwrap_or_default();
        code.chars()
            .take(digits.clamp(1, 3))
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    }

    /// Full three-digit status code
    pub fn status_code(&self) -> u16 {
        self.status(3)
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        self.status(1) == 2
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status(1) == 4
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status(1) == 5
    }

    /// Transport info field
    pub fn info(&self, key: &str) -> Option<&Scalar> {
        self.info.get(key)
    }

    /// Transport info field with a fallback
    pub fn info_or(&self, key: &str, default: impl Into<Scalar>) -> Scalar {
        self.info(key).cloned().unwrap_or_else(|| default.into())
    }

    /// All transport info fields
    pub fn info_map(&self) -> &Info {
        &self.info
    }

    /// Case-insensitive header lookup
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Header lookup with a fallback
    pub fn header_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.header(key).unwrap_or(default)
    }

    /// Headers in arrival order, names lower-cased
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Raw body
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Body as text, lossy; empty when absent
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.payload().unwrap_or_default()).into_owned()
    }

    /// Parsed `Content-Type`
    pub fn mime(&self) -> &MimeType {
        &self.mime
    }

    /// MIME top-level type
    pub fn mime_type(&self) -> Option<&str> {
        self.mime.type_name()
    }

    /// MIME subtype
    pub fn mime_subtype(&self) -> Option<&str> {
        self.mime.subtype()
    }

    /// MIME registration tree
    pub fn mime_tree(&self) -> Option<&str> {
        self.mime.tree()
    }

    /// MIME structured syntax suffix
    pub fn mime_suffix(&self) -> Option<&str> {
        self.mime.suffix()
    }

    /// MIME parameters, unparsed
    pub fn mime_params(&self) -> Option<&str> {
        self.mime.params()
    }

    /// `type/subtype` if it matches the given filters, `None` otherwise
    ///
    /// ```
    /// use http_envelope::{Envelope, Info};
    ///
    /// let envelope = Envelope::new(
    ///     "id",
    ///     Info::new(),
    ///     [("Content-Type", "application/json")],
    ///     None,
    /// );
    /// assert_eq!(envelope.content_type(Some("application"), None).as_deref(), Some("application/json"));
    /// assert_eq!(envelope.content_type(Some("text"), None), None);
    /// ```
    pub fn content_type(
        &self,
        type_name: Option<&str>,
        subtype: Option<&str>,
    ) -> Option<String> {
        let matches = |expected: Option<&str>, actual: Option<&str>| match expected {
            Some(expected) => actual.is_some_and(|a| a.eq_ignore_ascii_case(expected)),
            None => true,
        };
        if !matches(type_name, self.mime_type()) || !matches(subtype, self.mime_subtype()) {
            return None;
        }
        self.mime.essence()
    }

    /// Decomposed effective request URL
    pub fn url(&self) -> Option<UrlParts> {
        let url = self.info(INFO_URL)?.to_string();
        Url::parse(&url).ok().map(|url| UrlParts::from(&url))
    }

    /// A single facet of the effective request URL
    pub fn url_part(&self, part: UrlPart) -> Option<Scalar> {
        self.url()?.get(part)
    }

    /// Decode the body according to its content type
    pub fn decode(&self, default_type: Option<&str>) -> Response<Value> {
        decode::decode(self, default_type)
    }

    /// Decode the body as JSON
    pub fn decode_json(&self, associative: bool) -> Response<Value> {
        decode::decode_json(self, associative)
    }

    /// Decode a JSON body into `T`
    pub fn decode_as<T: DeserializeOwned>(&self) -> Response<T> {
        decode::decode_as(self)
    }

    /// Header block followed by the raw body, HTTP/1.x framed
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in self.headers() {
            out.extend_from_slice(format!("{key}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        if let Some(payload) = self.payload() {
            out.extend_from_slice(payload);
        }
        out
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.render()))
    }
}
