//! Request building and response interpretation on top of a pluggable HTTP
//! transport.
//!
//! Requests are described by a path template such as `/item/:item_id.json`
//! and a flat, ordered parameter map. Placeholders are filled from the map and
//! everything left over becomes the query string. Responses come back as an
//! immutable [`Envelope`] whose `Content-Type` drives body decoding.
//!
//! # Example
//!
//! ```no_run
//! use http_envelope::{params, HttpClient, HttpError};
//! use url::Url;
//!
//! async fn example() -> Result<serde_json::Value, HttpError> {
//!     let client = HttpClient::builder()
//!         .base_url(Url::parse("https://api.example.com")?)
//!         .build()?;
//!
//!     // GET https://api.example.com/item/1234.json?sort=name
//!     let envelope = client
//!         .get("/item/:item_id.json")
//!         .params(params! { "item_id" => 1234, "sort" => "name" })
//!         .send()
//!         .await?;
//!
//!     envelope.decode(Some("application/json"))
//! }
//! ```

mod backends;
mod client;
mod config;
mod decode;
mod envelope;
mod error;
mod map;
mod mime;
mod path;
mod transport;
mod value;

#[cfg(feature = "reqwest")]
pub use backends::ReqwestTransport;
pub use client::{HttpClient, HttpClientBuilder, RequestBuilder};
pub use crate::config::{
    ClientConfig, ProxySettings, ENV_HTTP_ENVELOPE_ACCEPT_INVALID_CERTS,
    ENV_HTTP_ENVELOPE_BASE_URL, ENV_HTTP_ENVELOPE_PROXY_MATCHER, ENV_HTTP_ENVELOPE_PROXY_URL,
    ENV_HTTP_ENVELOPE_TIMEOUT_SECS, ENV_HTTP_ENVELOPE_USER_AGENT,
};
pub use decode::{decode, decode_as, decode_json};
pub use envelope::{Envelope, UrlPart, UrlParts, INFO_HTTP_CODE, INFO_URL};
pub use error::{HttpError, JsonErrorCode, Response};
pub use map::{Info, OrderedMap, Params};
pub use mime::MimeType;
pub use path::{encode_component, resolve, ResolvedUri};
pub use transport::{Method, Transport, TransportRequest, TransportResponse};
pub use value::Scalar;
