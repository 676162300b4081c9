//! Token Exchange
//!
//! One POST to `{tenant}/oauth/token` per exchange, with a JSON body shaped
//! by the grant and Basic auth for the secret-carrying grants. The parsed
//! response is returned verbatim; non-2xx and non-JSON responses are hard
//! failures, with no retries.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{OAuthError, OAuthResult, ParseError};
use crate::types::{GrantRequest, TokenResponse};

/// Client for the tenant's token endpoint.
pub struct TokenExchangeClient<T: HttpTransport> {
    tenant_url: Url,
    client_id: String,
    transport: Arc<T>,
}

impl<T: HttpTransport> TokenExchangeClient<T> {
    /// Create a new exchange client sharing the given transport.
    pub fn new(tenant_url: Url, client_id: String, transport: Arc<T>) -> Self {
        Self {
            tenant_url,
            client_id,
            transport,
        }
    }

    /// The token endpoint URL.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/oauth/token",
            self.tenant_url.as_str().trim_end_matches('/')
        )
    }

    /// Exchange the grant for a token response.
    pub async fn exchange(&self, grant: GrantRequest) -> OAuthResult<TokenResponse> {
        debug!(grant_type = grant.grant_type(), "exchanging grant for tokens");

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        headers.insert("accept".to_string(), "application/json".to_string());
        if let Some(authorization) = grant.basic_auth_header(&self.client_id) {
            headers.insert("authorization".to_string(), authorization);
        }

        let request = HttpRequest {
            url: self.token_endpoint(),
            headers,
            body: grant.body(&self.client_id).to_string(),
        };

        let response = self.transport.post(request).await?;

        if !(200..300).contains(&response.status) {
            return Err(OAuthError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        let document = serde_json::from_str(&response.body).map_err(|e| {
            OAuthError::Parse(ParseError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        Ok(TokenResponse::new(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MockHttpTransport, ReqwestHttpTransport};
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(transport: Arc<MockHttpTransport>) -> TokenExchangeClient<MockHttpTransport> {
        TokenExchangeClient::new(
            Url::parse("https://tenant.example.com").unwrap(),
            "abc".to_string(),
            transport,
        )
    }

    #[test]
    fn test_token_endpoint_with_and_without_trailing_slash() {
        let transport = Arc::new(MockHttpTransport::new());
        let plain = client(transport.clone());
        assert_eq!(
            plain.token_endpoint(),
            "https://tenant.example.com/oauth/token"
        );

        let slashed = TokenExchangeClient::new(
            Url::parse("https://tenant.example.com/").unwrap(),
            "abc".to_string(),
            transport,
        );
        assert_eq!(
            slashed.token_endpoint(),
            "https://tenant.example.com/oauth/token"
        );
    }

    #[tokio::test]
    async fn test_client_credentials_request_shape() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "at"}));

        let response = client(transport.clone())
            .exchange(GrantRequest::ClientCredentials {
                client_secret: SecretString::new("s3cr3t".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.access_token(), Some("at"));

        let request = transport.get_last_request().unwrap();
        assert_eq!(request.url, "https://tenant.example.com/oauth/token");
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Basic YWJjOnMzY3IzdA==")
        );
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(
            body,
            json!({"scope": "user_default", "grant_type": "client_credentials"})
        );
    }

    #[tokio::test]
    async fn test_authorization_code_request_has_no_auth_header() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &json!({"access_token": "at"}));

        client(transport.clone())
            .exchange(GrantRequest::AuthorizationCode {
                code: "c0de".to_string(),
                code_verifier: "v".to_string(),
                redirect_uri: Url::parse("http://localhost:8123/").unwrap(),
            })
            .await
            .unwrap();

        let request = transport.get_last_request().unwrap();
        assert!(!request.headers.contains_key("authorization"));
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["grant_type"], "authorization_code");
        assert_eq!(body["client_id"], "abc");
        assert_eq!(body["code"], "c0de");
    }

    #[tokio::test]
    async fn test_non_success_status_is_hard_failure() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(401, &json!({"error": "invalid_client"}));

        let result = client(transport)
            .exchange(GrantRequest::RefreshToken {
                refresh_token: "rt".to_string(),
            })
            .await;

        match result {
            Err(OAuthError::HttpStatus { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("expected HttpStatus error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_response(crate::core::HttpResponse {
            status: 200,
            body: "<html>gateway error</html>".to_string(),
        });

        let result = client(transport)
            .exchange(GrantRequest::RefreshToken {
                refresh_token: "rt".to_string(),
            })
            .await;
        assert!(matches!(result, Err(OAuthError::Parse(_))));
    }

    #[tokio::test]
    async fn test_exchange_against_local_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Basic YWJjOnMzY3IzdA=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "wire-at",
                "refresh_token": "wire-rt",
            })))
            .mount(&server)
            .await;

        let exchange = TokenExchangeClient::new(
            Url::parse(&server.uri()).unwrap(),
            "abc".to_string(),
            Arc::new(ReqwestHttpTransport::new().unwrap()),
        );

        let response = exchange
            .exchange(GrantRequest::Impersonation {
                client_secret: SecretString::new("s3cr3t".to_string()),
                subject: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.access_token(), Some("wire-at"));
        assert_eq!(response.refresh_token(), Some("wire-rt"));
    }
}
