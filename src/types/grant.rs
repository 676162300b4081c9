//! Grant Types
//!
//! Each grant variant maps to a specific token request body shape and an
//! auth header policy. Bodies are JSON, matching what the tenant's token
//! endpoint expects.

use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use url::Url;

/// Scope sent with the non-interactive grants.
pub const USER_DEFAULT_SCOPE: &str = "user_default";

/// Grant type URN for Qlik user impersonation.
pub const IMPERSONATION_GRANT_TYPE: &str = "urn:qlik:oauth:user-impersonation";

/// A token request, tagged by grant.
///
/// The interactive variants carry no client secret and authenticate through
/// the PKCE verifier or refresh token alone; the machine-to-machine variants
/// carry the secret and authenticate with HTTP Basic.
pub enum GrantRequest {
    /// First-time exchange of an authorization code obtained in the browser.
    AuthorizationCode {
        code: String,
        code_verifier: String,
        redirect_uri: Url,
    },
    /// Exchange of a previously issued refresh token.
    RefreshToken { refresh_token: String },
    /// Machine-to-machine client credentials.
    ClientCredentials { client_secret: SecretString },
    /// Machine-to-machine impersonation of a subject.
    Impersonation {
        client_secret: SecretString,
        subject: String,
    },
}

impl GrantRequest {
    /// Request body for this grant, as sent to `{tenant}/oauth/token`.
    pub fn body(&self, client_id: &str) -> Value {
        match self {
            Self::AuthorizationCode {
                code,
                code_verifier,
                redirect_uri,
            } => json!({
                "client_id": client_id,
                "code_verifier": code_verifier,
                "grant_type": "authorization_code",
                "code": code,
                "redirect_uri": redirect_uri.as_str(),
            }),
            Self::RefreshToken { refresh_token } => json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            }),
            Self::ClientCredentials { .. } => json!({
                "scope": USER_DEFAULT_SCOPE,
                "grant_type": "client_credentials",
            }),
            Self::Impersonation { subject, .. } => json!({
                "scope": USER_DEFAULT_SCOPE,
                "grant_type": IMPERSONATION_GRANT_TYPE,
                "user_lookup": {
                    "field": "subject",
                    "value": subject,
                },
            }),
        }
    }

    /// `Authorization: Basic base64(client_id:client_secret)` header value,
    /// for the grants that carry a client secret.
    pub fn basic_auth_header(&self, client_id: &str) -> Option<String> {
        let secret = match self {
            Self::ClientCredentials { client_secret }
            | Self::Impersonation { client_secret, .. } => client_secret,
            Self::AuthorizationCode { .. } | Self::RefreshToken { .. } => return None,
        };
        let credentials = format!("{}:{}", client_id, secret.expose_secret());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Some(format!("Basic {}", encoded))
    }

    /// Grant type name, for logging.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
            Self::ClientCredentials { .. } => "client_credentials",
            Self::Impersonation { .. } => IMPERSONATION_GRANT_TYPE,
        }
    }
}

impl std::fmt::Debug for GrantRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never leak verifiers, codes, or secrets through Debug.
        f.debug_struct("GrantRequest")
            .field("grant_type", &self.grant_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_code_body() {
        let grant = GrantRequest::AuthorizationCode {
            code: "XYZ123".to_string(),
            code_verifier: "verifier-value".to_string(),
            redirect_uri: Url::parse("http://localhost:8123/").unwrap(),
        };

        let body = grant.body("my-client");
        assert_eq!(
            body,
            json!({
                "client_id": "my-client",
                "code_verifier": "verifier-value",
                "grant_type": "authorization_code",
                "code": "XYZ123",
                "redirect_uri": "http://localhost:8123/",
            })
        );
        assert!(grant.basic_auth_header("my-client").is_none());
    }

    #[test]
    fn test_refresh_token_body() {
        let grant = GrantRequest::RefreshToken {
            refresh_token: "rt-9".to_string(),
        };

        assert_eq!(
            grant.body("ignored"),
            json!({"grant_type": "refresh_token", "refresh_token": "rt-9"})
        );
        assert!(grant.basic_auth_header("ignored").is_none());
    }

    #[test]
    fn test_client_credentials_body_and_header() {
        let grant = GrantRequest::ClientCredentials {
            client_secret: SecretString::new("s3cr3t".to_string()),
        };

        assert_eq!(
            grant.body("abc"),
            json!({"scope": "user_default", "grant_type": "client_credentials"})
        );
        // base64("abc:s3cr3t")
        assert_eq!(
            grant.basic_auth_header("abc").as_deref(),
            Some("Basic YWJjOnMzY3IzdA==")
        );
    }

    #[test]
    fn test_impersonation_body() {
        let grant = GrantRequest::Impersonation {
            client_secret: SecretString::new("s3cr3t".to_string()),
            subject: "u1".to_string(),
        };

        assert_eq!(
            grant.body("abc"),
            json!({
                "scope": "user_default",
                "grant_type": "urn:qlik:oauth:user-impersonation",
                "user_lookup": {"field": "subject", "value": "u1"},
            })
        );
        assert!(grant.basic_auth_header("abc").is_some());
    }

    #[test]
    fn test_debug_redacts_payload() {
        let grant = GrantRequest::ClientCredentials {
            client_secret: SecretString::new("s3cr3t".to_string()),
        };
        let printed = format!("{:?}", grant);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("client_credentials"));
    }
}
