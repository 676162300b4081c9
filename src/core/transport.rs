//! HTTP Transport
//!
//! Token endpoint transport seam. The production implementation wraps a
//! single shared `reqwest::Client`; the client is stateless per request, so
//! one instance is reused across all exchanges for connection reuse.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{NetworkError, OAuthError};

/// A POST to the token endpoint.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// JSON request body.
    pub body: String,
}

/// Response from the token endpoint, returned verbatim.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a POST request.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, OAuthError>;
}

/// Default reqwest-based transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
}

impl ReqwestHttpTransport {
    /// Create a transport with the default timeout (30 seconds).
    pub fn new() -> Result<Self, OAuthError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, OAuthError> {
        let mut builder = self.client.post(&request.url).body(request.body);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        let response = builder.send().await.map_err(|e| {
            OAuthError::Network(NetworkError::RequestFailed {
                message: e.to_string(),
            })
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            OAuthError::Network(NetworkError::RequestFailed {
                message: e.to_string(),
            })
        })?;

        Ok(HttpResponse { status, body })
    }
}

/// Mock transport for testing.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: std::sync::Mutex<Vec<HttpResponse>>,
    request_history: std::sync::Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Queue a JSON response with the given status.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        self.queue_response(HttpResponse {
            status,
            body: serde_json::to_string(body).unwrap(),
        })
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, OAuthError> {
        self.request_history.lock().unwrap().push(request);

        self.responses.lock().unwrap().pop().ok_or_else(|| {
            OAuthError::Network(NetworkError::RequestFailed {
                message: "no mock response available".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_queue_and_history() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(200, &serde_json::json!({"access_token": "at"}));

        let request = HttpRequest {
            url: "https://tenant.example.com/oauth/token".to_string(),
            headers: HashMap::new(),
            body: "{}".to_string(),
        };

        let response = transport.post(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("at"));

        let history = transport.get_requests();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].url, "https://tenant.example.com/oauth/token");
    }

    #[tokio::test]
    async fn test_mock_transport_empty_queue_is_network_error() {
        let transport = MockHttpTransport::new();
        let result = transport
            .post(HttpRequest {
                url: "https://tenant.example.com/oauth/token".to_string(),
                headers: HashMap::new(),
                body: "{}".to_string(),
            })
            .await;
        assert!(matches!(result, Err(OAuthError::Network(_))));
    }
}
