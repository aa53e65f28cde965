//! HTTP transport seam.
//!
//! The agent never talks to the network directly; it hands a method, URL and
//! optional body to a [`Transport`]. [`HttpTransport`] is the default,
//! backed by a blocking `reqwest` client.

use crate::error::TransportError;
use crate::types::{Method, RequestOptions};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// What a transport hands back: status, final URL, headers and raw body.
///
/// Status codes are not interpreted by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// URL after redirects.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs HTTP calls on behalf of an [`Agent`](crate::Agent).
pub trait Transport {
    /// Send a request. `body` of `None` means no request body at all.
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        options: &RequestOptions,
    ) -> Result<RawResponse, TransportError>;

    /// Plain `GET` with no extras.
    fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.send(Method::Get, url, None, &RequestOptions::default())
    }
}

#[cfg(feature = "remote")]
impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Blocking HTTP transport.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    headers: Vec<(String, String)>,
}

#[cfg(feature = "remote")]
impl HttpTransport {
    /// Build a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            headers: Vec::new(),
        }
    }

    /// Add a header sent with every request.
    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, TransportError> {
        self.set_header(name, value)?;
        Ok(self)
    }

    /// Add or replace a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidHeader` if the name or value isn't a
    /// valid HTTP header.
    pub fn set_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TransportError> {
        let name = name.into();
        let value = value.into();

        reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;
        reqwest::header::HeaderValue::from_str(&value).map_err(|e| {
            TransportError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;

        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value));
        Ok(())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[cfg(feature = "remote")]
impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        options: &RequestOptions,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.client.request(method.into(), url);

        for (name, value) in self.headers.iter().chain(options.headers.iter()) {
            request = request.header(name.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send()?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes()?.to_vec();

        Ok(RawResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_success_range() {
        let mut raw = RawResponse {
            status: 200,
            ..Default::default()
        };
        assert!(raw.is_success());
        raw.status = 204;
        assert!(raw.is_success());
        raw.status = 404;
        assert!(!raw.is_success());
    }

    #[test]
    fn raw_response_header_case_insensitive() {
        let raw = RawResponse {
            headers: vec![("content-type".into(), "application/json".into())],
            ..Default::default()
        };
        assert_eq!(raw.header("Content-Type"), Some("application/json"));
        assert_eq!(raw.header("etag"), None);
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn set_header_replaces_existing() {
            let mut transport = HttpTransport::new().unwrap();
            transport.set_header("Accept", "text/plain").unwrap();
            transport.set_header("accept", "application/json").unwrap();
            assert_eq!(
                transport.headers(),
                &[("accept".to_string(), "application/json".to_string())]
            );
        }

        #[test]
        fn set_header_rejects_invalid_name() {
            let mut transport = HttpTransport::new().unwrap();
            let result = transport.set_header("bad header", "x");
            assert!(matches!(result, Err(TransportError::InvalidHeader { .. })));
        }

        #[test]
        fn method_converts_to_reqwest() {
            assert_eq!(reqwest::Method::from(Method::Patch), reqwest::Method::PATCH);
            assert_eq!(reqwest::Method::from(Method::Get), reqwest::Method::GET);
        }
    }
}
