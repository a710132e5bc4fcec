//! reqwest-based transport

use std::time::{Duration, Instant};

use crate::client::ProxyConfig;
use crate::envelope::{INFO_HTTP_CODE, INFO_URL};
use crate::error::{HttpError, Response};
use crate::map::Info;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Transport executing requests with a [`reqwest::Client`]
///
/// Every response gets a fresh UUID v4 as its id. Reported info fields:
/// `url`, `http_code`, `effective_method`, `total_time` (seconds),
/// `size_download`, `content_type`, and `primary_ip` / `primary_port` when
/// the peer address is known.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with reqwest's default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing reqwest client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    pub(crate) fn configure(
        accept_invalid_certs: bool,
        timeout: Option<Duration>,
        user_agent: Option<&str>,
        proxy: Option<ProxyConfig>,
    ) -> Response<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(accept_invalid_certs);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }

        if let Some(proxy_config) = proxy {
            let proxy_url = proxy_config.url.to_string();
            let proxy = if let Some(matcher) = proxy_config.matcher {
                reqwest::Proxy::custom(move |url| {
                    if matcher.is_match(url.host_str().unwrap_or("")) {
                        Some(proxy_url.clone())
                    } else {
                        None
                    }
                })
            } else {
                reqwest::Proxy::all(&proxy_url).map_err(|e| HttpError::Proxy(e.to_string()))?
            };
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(HttpError::from)?;
        Ok(Self { inner: client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Response<TransportResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| HttpError::Build(e.to_string()))?;

        let mut builder = self.inner.request(method, request.uri);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let remote_addr = response.remote_addr();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?;

        let mut info = Info::new()
            .with(INFO_URL, final_url)
            .with(INFO_HTTP_CODE, status)
            .with("effective_method", request.method.as_str())
            .with("total_time", started.elapsed().as_secs_f64())
            .with("size_download", i64::try_from(body.len()).unwrap_or(i64::MAX));
        if let Some((_, content_type)) = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            info.insert("content_type", content_type.as_str());
        }
        if let Some(addr) = remote_addr {
            info.insert("primary_ip", addr.ip().to_string());
            info.insert("primary_port", addr.port());
        }

        Ok(TransportResponse {
            id: uuid::Uuid::new_v4().to_string(),
            info,
            headers,
            body: (!body.is_empty()).then(|| body.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_defaults() {
        assert!(ReqwestTransport::configure(false, None, None, None).is_ok());
    }

    #[test]
    fn test_configure_with_proxy_and_timeout() {
        let proxy = ProxyConfig {
            url: url::Url::parse("http://localhost:8080").expect("Valid proxy URL"),
            matcher: Some(regex::Regex::new(r".*\.example\.com$").expect("Valid pattern")),
        };
        let result = ReqwestTransport::configure(
            true,
            Some(Duration::from_secs(5)),
            Some("envelope-test/1.0"),
            Some(proxy),
        );
        assert!(result.is_ok());
    }
}
