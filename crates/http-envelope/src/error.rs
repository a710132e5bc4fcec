//! HTTP error types

use std::fmt;

use serde_json::error::Category;
use thiserror::Error;

/// Diagnostic code of a failed JSON decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonErrorCode {
    /// Failure reading the underlying bytes
    Io,
    /// Input is not syntactically valid JSON
    Syntax,
    /// Valid JSON that does not fit the requested type
    Data,
    /// Input ended before a complete value was read
    Eof,
}

impl From<Category> for JsonErrorCode {
    fn from(category: Category) -> Self {
        match category {
            Category::Io => Self::Io,
            Category::Syntax => Self::Syntax,
            Category::Data => Self::Data,
            Category::Eof => Self::Eof,
        }
    }
}

impl fmt::Display for JsonErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Io => "io",
            Self::Syntax => "syntax",
            Self::Data => "data",
            Self::Eof => "eof",
        };
        f.write_str(code)
    }
}

/// HTTP Response type - generic over the body type R and error type E
pub type Response<R, E = HttpError> = Result<R, E>;

/// HTTP errors that can occur while building requests or reading responses
#[derive(Debug, Error)]
pub enum HttpError {
    /// A path placeholder has no matching parameter
    #[error("Missing parameter for placeholder `:{0}`")]
    MissingParameter(String),
    /// Decoding was attempted without a content type
    #[error("No content type available to decode the response")]
    NoContentType,
    /// No decoder is registered for the content type
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    /// Body decoding failed
    #[error("Decode error ({code}): {message}")]
    Decode {
        /// Parser diagnostic
        message: String,
        /// Parser error code
        code: JsonErrorCode,
    },
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Proxy error
    #[error("Proxy error: {0}")]
    Proxy(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Invalid request URL
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Configuration error
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    pub(crate) fn decode(err: &serde_json::Error) -> Self {
        HttpError::Decode {
            message: err.to_string(),
            code: err.classify().into(),
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_display() {
        let error = HttpError::MissingParameter("item_id".to_string());
        assert_eq!(
            format!("{}", error),
            "Missing parameter for placeholder `:item_id`"
        );
    }

    #[test]
    fn test_unsupported_content_type_display() {
        let error = HttpError::UnsupportedContentType("text/plain".to_string());
        assert_eq!(format!("{}", error), "Unsupported content type: text/plain");
    }

    #[test]
    fn test_http_error_status_display() {
        let error = HttpError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP error (404): Not Found");
    }

    #[test]
    fn test_http_error_timeout_display() {
        assert_eq!(format!("{}", HttpError::Timeout), "Request timeout");
    }

    #[test]
    fn test_decode_carries_parser_code() {
        let err = serde_json::from_str::<serde_json::Value>("{a:}")
            .expect_err("Invalid JSON should produce an error");
        match HttpError::decode(&err) {
            HttpError::Decode { message, code } => {
                assert_eq!(code, JsonErrorCode::Syntax);
                assert!(message.contains("line 1"));
            }
            other => panic!("Expected HttpError::Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_eof_code() {
        let err = serde_json::from_str::<serde_json::Value>("")
            .expect_err("Empty input should produce an error");
        assert!(matches!(
            HttpError::decode(&err),
            HttpError::Decode {
                code: JsonErrorCode::Eof,
                ..
            }
        ));
    }

    #[test]
    fn test_from_serde_json_error() {
        let result: Result<String, _> = serde_json::from_str("not valid json");
        let json_error = result.expect_err("Invalid JSON should produce an error");
        let http_error: HttpError = json_error.into();

        match http_error {
            HttpError::Serialization(msg) => {
                assert!(
                    msg.contains("expected"),
                    "Error message should describe JSON error"
                );
            }
            _ => panic!("Expected HttpError::Serialization"),
        }
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").expect_err("Relative URL must fail");
        let http_error: HttpError = err.into();
        assert!(matches!(http_error, HttpError::Url(_)));
    }
}
