//! Transport collaborator
//!
//! The transport performs the actual network I/O. It receives a fully
//! resolved request and hands back raw status info, headers and body.

use std::fmt;

use url::Url;

use crate::envelope::Envelope;
use crate::error::Response;
use crate::map::Info;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Method
    pub method: Method,
    /// Absolute URI, query included
    pub uri: Url,
    /// Header name/value pairs, in the order they were set
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Option<Vec<u8>>,
}

/// Raw transport output for one request
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Transport-assigned request identifier
    pub id: String,
    /// Status and timing metadata, see [`crate::envelope::INFO_HTTP_CODE`]
    pub info: Info,
    /// Response headers as received
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Option<Vec<u8>>,
}

impl From<TransportResponse> for Envelope {
    fn from(response: TransportResponse) -> Self {
        Envelope::new(response.id, response.info, response.headers, response.body)
    }
}

/// Executes resolved requests
#[async_trait::async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Perform the request, failing only on transport errors
    async fn execute(&self, request: TransportRequest) -> Response<TransportResponse>;
}
