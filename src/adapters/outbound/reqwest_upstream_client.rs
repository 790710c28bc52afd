//! Reqwest Upstream Client
//!
//! Implements UpstreamClient on top of a shared reqwest connection pool.
//! Each request is bounded by a timeout and a maximum body size; dropping
//! the future aborts it.

use crate::domain::entities::{OutboundRequest, UpstreamResponse};
use crate::domain::errors::UpstreamError;
use crate::domain::ports::UpstreamClient;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Method;
use std::time::Duration;

/// Default cap on a backend reply body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestUpstreamClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rules-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Reject replies whose body is larger than `max_body_bytes`.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    fn body_too_large(&self) -> UpstreamError {
        UpstreamError::Request(format!(
            "response body exceeds {} bytes",
            self.max_body_bytes
        ))
    }

    /// Read the reply body, stopping as soon as it passes the cap.
    async fn read_body(&self, mut resp: reqwest::Response) -> Result<Bytes, UpstreamError> {
        if resp
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(self.body_too_large());
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = resp.chunk().await.map_err(Self::classify)? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.body_too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    fn classify(err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_connect() {
            UpstreamError::Connect(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn execute(&self, request: OutboundRequest) -> Result<UpstreamResponse, UpstreamError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await.map_err(Self::classify)?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = self.read_body(resp).await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ReqwestUpstreamClient {
        ReqwestUpstreamClient::new(Duration::from_secs(5)).unwrap()
    }

    fn get(url: String) -> OutboundRequest {
        OutboundRequest {
            method: "GET".to_string(),
            url,
            headers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/rules"))
            .and(query_param("type", "alert"))
            .and(header("x-scope-orgid", "tenant-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "success"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut request = get(format!("{}/api/v1/rules?type=alert", mock_server.uri()));
        request
            .headers
            .push(("X-Scope-OrgID".to_string(), "tenant-1".to_string()));

        let resp = client().execute(request).await.unwrap();

        assert_eq!(resp.status, 200);
        assert!(resp.header("content-type").unwrap().starts_with("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn test_execute_error_status_is_ok() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/alerts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let resp = client()
            .execute(get(format!("{}/api/v1/alerts", mock_server.uri())))
            .await
            .unwrap();

        assert_eq!(resp.status, 503);
        assert_eq!(&resp.body[..], b"Service Unavailable");
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = ReqwestUpstreamClient::new(Duration::from_millis(100)).unwrap();
        let result = client
            .execute(get(format!("{}/api/v1/rules", mock_server.uri())))
            .await;

        assert_eq!(result.unwrap_err(), UpstreamError::Timeout);
    }

    #[tokio::test]
    async fn test_execute_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client()
            .execute(get(format!("http://{}/api/v1/rules", addr)))
            .await;

        assert!(matches!(result, Err(UpstreamError::Connect(_))));
    }

    #[tokio::test]
    async fn test_execute_invalid_method() {
        let mut request = get("http://127.0.0.1:1/".to_string());
        request.method = "NOT A METHOD".to_string();

        let result = client().execute(request).await;
        assert!(matches!(result, Err(UpstreamError::Request(_))));
    }

    #[tokio::test]
    async fn test_execute_body_over_limit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/rules"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&mock_server)
            .await;

        let client = client().with_max_body_bytes(1024);
        let result = client
            .execute(get(format!("{}/api/v1/rules", mock_server.uri())))
            .await;

        assert!(matches!(result, Err(UpstreamError::Request(msg)) if msg.contains("1024")));
    }

    #[tokio::test]
    async fn test_execute_body_at_limit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(1024)))
            .mount(&mock_server)
            .await;

        let client = client().with_max_body_bytes(1024);
        let resp = client
            .execute(get(format!("{}/api/v1/rules", mock_server.uri())))
            .await
            .unwrap();

        assert_eq!(resp.body.len(), 1024);
    }

    #[tokio::test]
    async fn test_dropped_request_is_abandoned() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&mock_server)
            .await;

        let client = client();
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            client.execute(get(format!("{}/api/v1/rules", mock_server.uri()))),
        )
        .await;

        // The outer deadline wins over both the client timeout and the delay
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);

        // The pool stays usable after the abandoned call
        Mock::given(method("GET"))
            .and(path("/api/v1/alerts"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&mock_server)
            .await;
        let resp = client
            .execute(get(format!("{}/api/v1/alerts", mock_server.uri())))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
    }
}
