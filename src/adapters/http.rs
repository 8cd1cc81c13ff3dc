use crate::core::{ConfigProvider, Headers, HttpRequest, HttpResponse, HttpTransport, Method, StatusCode};
use crate::utils::error::{ClientError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// `HttpTransport` backed by `reqwest`. Owns the only timeout policy in the
/// client; requests are never retried.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(base_url)?,
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut transport = Self::new(config.base_url())?;
        transport.headers = to_header_map(config.default_headers())?;
        transport.timeout = config.timeout();
        Ok(transport)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Transport {
                message: format!("Invalid request path '{}': {}", path, e),
            })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.endpoint(&request.path)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        builder = builder.headers(self.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = StatusCode(response.status().as_u16());
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// Directory-style base so that `join` keeps any path prefix, e.g. a gateway mount point.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    Url::parse(&normalized).map_err(|e| ClientError::InvalidConfigValueError {
        field: "api.base_url".to_string(),
        value: base_url.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })
}

fn to_header_map(headers: Headers) -> Result<HeaderMap> {
    headers
        .into_iter()
        .map(|(k, v)| {
            let name = HeaderName::from_str(&k).map_err(|e| ClientError::InvalidConfigValueError {
                field: "api.headers".to_string(),
                value: k.clone(),
                reason: e.to_string(),
            })?;
            let value =
                HeaderValue::from_str(&v).map_err(|e| ClientError::InvalidConfigValueError {
                    field: format!("api.headers.{}", k),
                    value: v.clone(),
                    reason: e.to_string(),
                })?;
            Ok((name, value))
        })
        .collect::<Result<HeaderMap>>()
}

fn transport_error(e: reqwest::Error) -> ClientError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    ClientError::Transport {
        message: format!("{}: {}", kind, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        base_url: String,
        headers: Headers,
    }

    impl ConfigProvider for MockConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }

        fn default_headers(&self) -> Headers {
            self.headers.clone()
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let transport = ReqwestTransport::new("https://gateway.example.org/social").unwrap();
        let url = transport.endpoint("/api/prestations/3").unwrap();
        assert_eq!(url.as_str(), "https://gateway.example.org/social/api/prestations/3");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = ReqwestTransport::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_from_config_applies_headers_and_timeout() {
        let mut headers = HashMap::new();
        headers.insert("X-User-Email".to_string(), "jane@example.org".to_string());
        let config = MockConfig {
            base_url: "http://localhost:8080".to_string(),
            headers,
        };

        let transport = ReqwestTransport::from_config(&config).unwrap();

        assert_eq!(transport.timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            transport.headers.get("x-user-email").unwrap(),
            "jane@example.org"
        );
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "value".to_string());
        let config = MockConfig {
            base_url: "http://localhost:8080".to_string(),
            headers,
        };

        assert!(ReqwestTransport::from_config(&config).is_err());
    }
}
