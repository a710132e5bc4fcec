//! HTTP client wrapper

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::{HttpError, Response};
use crate::map::Params;
use crate::path::{self, ResolvedUri};
use crate::transport::{Method, Transport, TransportRequest};
use crate::value::Scalar;

/// HTTP client wrapper
///
/// Resolves path templates against an optional base URL, hands the request
/// to its [`Transport`] and wraps whatever comes back in an [`Envelope`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: Option<Url>,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
}

#[cfg(feature = "reqwest")]
impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    #[cfg(feature = "reqwest")]
    pub fn new() -> Self {
        Self::with_transport(crate::backends::ReqwestTransport::new())
    }

    /// Create a new HTTP client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            base_url: None,
            headers: Vec::new(),
            transport: Arc::new(transport),
        }
    }

    /// Base URL that templates are resolved against
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Start a request
    pub fn request(&self, method: Method, template: &str) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            template: template.to_string(),
            params: Params::new(),
            headers: self.headers.clone(),
            body: None,
            error: None,
        }
    }

    /// GET request builder
    pub fn get(&self, template: &str) -> RequestBuilder {
        self.request(Method::Get, template)
    }

    /// POST request builder
    pub fn post(&self, template: &str) -> RequestBuilder {
        self.request(Method::Post, template)
    }

    /// PUT request builder
    pub fn put(&self, template: &str) -> RequestBuilder {
        self.request(Method::Put, template)
    }

    /// PATCH request builder
    pub fn patch(&self, template: &str) -> RequestBuilder {
        self.request(Method::Patch, template)
    }

    /// DELETE request builder
    pub fn delete(&self, template: &str) -> RequestBuilder {
        self.request(Method::Delete, template)
    }

    /// HEAD request builder
    pub fn head(&self, template: &str) -> RequestBuilder {
        self.request(Method::Head, template)
    }

    /// GET request, returns JSON deserialized to R
    pub async fn fetch<R>(&self, template: &str, params: Params) -> Response<R>
    where
        R: DeserializeOwned,
    {
        self.get(template).params(params).send_json().await
    }

    /// Join the resolved path onto the base URL and attach the query
    ///
    /// A literal query or fragment written in the template is kept, and
    /// leftover parameters follow the template's own query.
    fn compose(&self, resolved: &ResolvedUri) -> Response<Url> {
        let mut url = match (&self.base_url, Url::parse(&resolved.path)) {
            (_, Ok(absolute)) => absolute,
            (Some(base), Err(_)) => {
                let (rest, fragment) = match resolved.path.split_once('#') {
                    Some((rest, fragment)) => (rest, Some(fragment)),
                    None => (resolved.path.as_str(), None),
                };
                let (relative, literal_query) = match rest.split_once('?') {
                    Some((relative, query)) => (relative, Some(query)),
                    None => (rest, None),
                };

                let mut url = base.clone();
                let path = format!(
                    "{}/{}",
                    base.path().trim_end_matches('/'),
                    relative.trim_start_matches('/')
                );
                url.set_path(&path);
                if let Some(query) = literal_query {
                    append_query(&mut url, query);
                }
                if fragment.is_some() {
                    url.set_fragment(fragment);
                }
                url
            }
            (None, Err(err)) => return Err(err.into()),
        };

        if !resolved.query.is_empty() {
            append_query(&mut url, &resolved.query_string());
        }
        Ok(url)
    }
}

/// Append `extra` to the URL's query with `&`
fn append_query(url: &mut Url, extra: &str) {
    if extra.is_empty() {
        return;
    }
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{extra}"),
        _ => extra.to_string(),
    };
    url.set_query(Some(&query));
}

/// Replace a header case-insensitively, or append it
fn set_header(headers: &mut Vec<(String, String)>, key: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    headers.push((key.to_string(), value.to_string()));
}

/// Request under construction
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    template: String,
    params: Params,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    error: Option<HttpError>,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    /// Add a path or query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Add several parameters, keeping their order
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        set_header(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    /// HTTP basic authentication
    pub fn basic_auth(self, username: &str, password: Option<&str>) -> Self {
        let credentials = format!("{username}:{}", password.unwrap_or_default());
        let value = format!("Basic {}", STANDARD.encode(credentials));
        self.header("Authorization", value)
    }

    /// Bearer token authentication
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Set the request body as JSON
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.body = Some(bytes);
                self.header("Content-Type", "application/json")
            }
            Err(e) => {
                self.error = Some(HttpError::from(e));
                self
            }
        }
    }

    /// Set the request body as form data
    pub fn form<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_urlencoded::to_string(body) {
            Ok(form) => {
                self.body = Some(form.into_bytes());
                self.header("Content-Type", "application/x-www-form-urlencoded")
            }
            Err(e) => {
                self.error = Some(HttpError::Serialization(e.to_string()));
                self
            }
        }
    }

    /// Set a raw body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Resolve the template into the final request URL without sending
    pub fn resolve(&self) -> Response<Url> {
        let resolved = path::resolve(&self.template, &self.params)?;
        self.client.compose(&resolved)
    }

    /// Send the request and wrap the response in an [`Envelope`]
    pub async fn send(self) -> Response<Envelope> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let uri = self.resolve()?;
        tracing::debug!(method = %self.method, %uri, "Sending request");

        let request = TransportRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body,
        };
        let envelope = Envelope::from(self.client.transport.execute(request).await?);

        tracing::debug!(
            id = envelope.id(),
            status = envelope.status_code(),
            content_type = envelope.header("content-type"),
            "Received response"
        );
        Ok(envelope)
    }

    /// Send the request and deserialize a successful JSON response
    pub async fn send_json<R: DeserializeOwned>(self) -> Response<R> {
        let envelope = self.send().await?;

        if !envelope.is_success() {
            return Err(HttpError::Status {
                status: envelope.status_code(),
                message: envelope.text(),
            });
        }

        envelope.decode_as()
    }
}

/// HTTP client builder for configuring proxy and TLS settings
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    base_url: Option<Url>,
    headers: Vec<(String, String)>,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    proxy: Option<ProxyConfig>,
}

#[derive(Debug)]
pub(crate) struct ProxyConfig {
    pub(crate) url: Url,
    pub(crate) matcher: Option<regex::Regex>,
}

impl HttpClientBuilder {
    /// Builder preloaded from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Response<Self> {
        let mut builder = Self::default().danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(Url::parse(base_url)?);
        }
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        for (key, value) in &config.headers {
            builder = builder.default_header(key, value);
        }
        if let Some(proxy) = &config.proxy {
            let url = Url::parse(&proxy.url)?;
            builder = match &proxy.matcher {
                Some(pattern) => builder.proxy_with_matcher(url, pattern)?,
                None => builder.proxy(url),
            };
        }
        Ok(builder)
    }

    /// Resolve request templates against this URL
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Header sent with every request
    pub fn default_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        set_header(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    /// Overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `User-Agent` header value
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Accept invalid TLS certificates
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, url: Url) -> Self {
        self.proxy = Some(ProxyConfig { url, matcher: None });
        self
    }

    /// Set a proxy URL with a host pattern matcher
    pub fn proxy_with_matcher(mut self, url: Url, pattern: &str) -> Response<Self> {
        let matcher = regex::Regex::new(pattern)
            .map_err(|e| HttpError::Proxy(format!("Invalid proxy pattern: {}", e)))?;
        self.proxy = Some(ProxyConfig {
            url,
            matcher: Some(matcher),
        });
        Ok(self)
    }

    /// Build the HTTP client on the reqwest transport
    #[cfg(feature = "reqwest")]
    pub fn build(self) -> Response<HttpClient> {
        let transport = crate::backends::ReqwestTransport::configure(
            self.accept_invalid_certs,
            self.timeout,
            self.user_agent.as_deref(),
            self.proxy,
        )?;
        Ok(HttpClient {
            base_url: self.base_url,
            headers: self.headers,
            transport: Arc::new(transport),
        })
    }

    /// Build the HTTP client on a custom transport
    ///
    /// Transport-level settings (TLS, proxy, timeout, user agent) are the
    /// transport's own business and are ignored here.
    pub fn build_with_transport(self, transport: impl Transport + 'static) -> HttpClient {
        HttpClient {
            base_url: self.base_url,
            headers: self.headers,
            transport: Arc::new(transport),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;
    use crate::envelope::{INFO_HTTP_CODE, INFO_URL};
    use crate::map::Info;
    use crate::params;
    use crate::transport::TransportResponse;

    /// Answers every request with a canned response and records what it saw
    #[derive(Debug, Default)]
    struct StubTransport {
        status: u16,
        content_type: &'static str,
        body: &'static str,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl StubTransport {
        fn new(status: u16, content_type: &'static str, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                content_type,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Transport for Arc<StubTransport> {
        async fn execute(&self, request: TransportRequest) -> Response<TransportResponse> {
            let info = Info::new()
                .with(INFO_URL, request.uri.as_str())
                .with(INFO_HTTP_CODE, self.status);
            self.seen.lock().expect("Lock not poisoned").push(request);
            Ok(TransportResponse {
                id: "stub-1".to_string(),
                info,
                headers: vec![("Content-Type".to_string(), self.content_type.to_string())],
                body: Some(self.body.as_bytes().to_vec()),
            })
        }
    }

    fn client(stub: &Arc<StubTransport>) -> HttpClient {
        HttpClient::builder()
            .base_url(Url::parse("https://api.example.com/v1/").expect("Valid URL"))
            .default_header("Accept", "application/json")
            .build_with_transport(Arc::clone(stub))
    }

    #[test]
    fn test_resolve_against_base_url() {
        let stub = StubTransport::new(200, "application/json", "{}");
        let url = client(&stub)
            .get("/item/:item_id.json")
            .params(params! { "item_id" => 1234, "sort" => "name" })
            .resolve()
            .expect("Template resolves");
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/item/1234.json?sort=name"
        );
    }

    #[test]
    fn test_resolve_keeps_literal_query_and_fragment() {
        let stub = StubTransport::new(200, "application/json", "{}");
        let client = client(&stub);

        let url = client
            .get("/search?type=all")
            .params(params! { "q" => "x" })
            .resolve()
            .expect("Template resolves");
        assert_eq!(url.as_str(), "https://api.example.com/v1/search?type=all&q=x");

        let url = client.get("/a#frag").resolve().expect("Template resolves");
        assert_eq!(url.as_str(), "https://api.example.com/v1/a#frag");

        let url = client
            .get("/items/:id?view=full#top")
            .params(params! { "id" => 7, "page" => 2 })
            .resolve()
            .expect("Template resolves");
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/items/7?view=full&page=2#top"
        );
    }

    #[test]
    fn test_resolve_absolute_template_without_base() {
        let stub = StubTransport::new(200, "application/json", "{}");
        let client = HttpClient::with_transport(Arc::clone(&stub));
        let url = client
            .get("https://example.org/users/:id")
            .param("id", 5)
            .param("q", "a b")
            .resolve()
            .expect("Template resolves");
        assert_eq!(url.as_str(), "https://example.org/users/5?q=a%20b");
    }

    #[test]
    fn test_relative_template_without_base_fails() {
        let stub = StubTransport::new(200, "application/json", "{}");
        let client = HttpClient::with_transport(Arc::clone(&stub));
        assert!(matches!(
            client.get("/relative").resolve(),
            Err(HttpError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_send_builds_envelope() {
        let stub = StubTransport::new(200, "application/json", r#"{"a":1}"#);
        let envelope = client(&stub)
            .get("/item/:id")
            .param("id", 9)
            .header("X-Trace", "t-1")
            .send()
            .await
            .expect("Request succeeds");

        assert_eq!(envelope.id(), "stub-1");
        assert_eq!(envelope.status_code(), 200);
        assert_eq!(
            envelope.decode(None).expect("JSON decodes"),
            serde_json::json!({"a": 1})
        );

        let seen = stub.seen.lock().expect("Lock not poisoned");
        let request = &seen[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.uri.path(), "/v1/item/9");
        assert!(request
            .headers
            .contains(&("Accept".to_string(), "application/json".to_string())));
        assert!(request
            .headers
            .contains(&("X-Trace".to_string(), "t-1".to_string())));
    }

    #[tokio::test]
    async fn test_missing_parameter_short_circuits() {
        let stub = StubTransport::new(200, "application/json", "{}");
        let result = client(&stub).get("/item/:id").send().await;
        assert!(matches!(result, Err(HttpError::MissingParameter(name)) if name == "id"));
        assert!(stub.seen.lock().expect("Lock not poisoned").is_empty());
    }

    #[tokio::test]
    async fn test_json_and_auth_headers() {
        let stub = StubTransport::new(201, "application/json", "{}");
        client(&stub)
            .post("/items")
            .basic_auth("user", Some("pass"))
            .json(&serde_json::json!({"name": "widget"}))
            .send()
            .await
            .expect("Request succeeds");

        let seen = stub.seen.lock().expect("Lock not poisoned");
        let request = &seen[0];
        assert_eq!(request.body.as_deref(), Some(br#"{"name":"widget"}"#.as_slice()));
        assert!(request.headers.contains(&(
            "Authorization".to_string(),
            "Basic dXNlcjpwYXNz".to_string()
        )));
        assert!(request
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
    }

    #[tokio::test]
    async fn test_header_override_is_case_insensitive() {
        let stub = StubTransport::new(200, "application/json", "{}");
        client(&stub)
            .get("/x")
            .header("accept", "text/plain")
            .send()
            .await
            .expect("Request succeeds");

        let seen = stub.seen.lock().expect("Lock not poisoned");
        let accepts: Vec<_> = seen[0]
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("accept"))
            .collect();
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0].1, "text/plain");
    }

    #[tokio::test]
    async fn test_send_json_error_status() {
        #[derive(Debug, Deserialize)]
        struct Never {}

        let stub = StubTransport::new(404, "text/plain", "Not Found");
        let result: Response<Never> = client(&stub).get("/missing").send_json().await;
        match result {
            Err(HttpError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("Expected HttpError::Status, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_proxy_with_invalid_matcher() {
        let proxy_url = Url::parse("http://localhost:8080").expect("Valid proxy URL");
        let result = HttpClientBuilder::default().proxy_with_matcher(proxy_url, r"[invalid");

        if let Err(HttpError::Proxy(msg)) = result {
            assert!(msg.contains("Invalid proxy pattern"));
        } else {
            panic!("Expected HttpError::Proxy");
        }
    }

    #[test]
    fn test_builder_from_config() {
        let config = ClientConfig {
            base_url: Some("https://api.example.com".to_string()),
            headers: [("Accept".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let builder = HttpClientBuilder::from_config(&config).expect("Valid config");
        assert_eq!(
            builder.base_url.as_ref().map(Url::as_str),
            Some("https://api.example.com/")
        );
        assert_eq!(builder.headers.len(), 1);
    }

    #[test]
    fn test_builder_from_config_rejects_bad_base_url() {
        let config = ClientConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            HttpClientBuilder::from_config(&config),
            Err(HttpError::Url(_))
        ));
    }
}
