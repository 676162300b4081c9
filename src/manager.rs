//! OAuth Manager
//!
//! Orchestrates the interactive PKCE browser flow and the non-interactive
//! grants against one tenant/client pair. A manager instance is created once
//! and reused across token calls; it is not designed for concurrent
//! overlapping calls on the same instance.

use base64::Engine;
use rand::Rng;
use secrecy::SecretString;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::core::{
    BrowserLauncher, BrowserSelector, CallbackListener, HttpTransport, ProcessBrowserLauncher,
    ReqwestHttpTransport,
};
use crate::error::{ConfigurationError, OAuthResult, ProtocolError};
use crate::exchange::TokenExchangeClient;
use crate::types::{AuthorizationSession, GrantRequest, TokenResponse};

/// Page served to the browser tab once the redirect is captured.
const DEFAULT_RESPONSE_PAGE: &str = "<html><style>h1 {text-align: center;} p {text-align: center;}</style><body><h1>Authentication complete</h1><p>You can close this tab.</p></body></html>";

/// OAuth manager for one tenant/client pair.
///
/// Owns the authorization session of the last `authorize_in_browser` call
/// and the token response of the last successful exchange. The HTTP
/// transport is created once at construction (or injected) and shared
/// across all exchanges.
pub struct OAuthManager<T: HttpTransport = ReqwestHttpTransport, L: BrowserLauncher = ProcessBrowserLauncher>
{
    tenant_url: Url,
    client_id: String,
    exchange: TokenExchangeClient<T>,
    launcher: L,
    authorization_response_page: String,
    session: Option<AuthorizationSession>,
    token: Option<TokenResponse>,
}

impl OAuthManager {
    /// Create a manager with the default transport and process launcher.
    pub fn new(tenant_url: &str, client_id: impl Into<String>) -> OAuthResult<Self> {
        let tenant_url = Url::parse(tenant_url).map_err(|_| ConfigurationError::InvalidTenantUrl {
            url: tenant_url.to_string(),
        })?;
        let transport = Arc::new(ReqwestHttpTransport::new()?);
        Ok(Self::with_components(
            tenant_url,
            client_id,
            transport,
            ProcessBrowserLauncher::new(),
        ))
    }
}

impl<T: HttpTransport, L: BrowserLauncher> OAuthManager<T, L> {
    /// Create a manager with injected transport and launcher.
    pub fn with_components(
        tenant_url: Url,
        client_id: impl Into<String>,
        transport: Arc<T>,
        launcher: L,
    ) -> Self {
        let client_id = client_id.into();
        let exchange = TokenExchangeClient::new(tenant_url.clone(), client_id.clone(), transport);
        Self {
            tenant_url,
            client_id,
            exchange,
            launcher,
            authorization_response_page: DEFAULT_RESPONSE_PAGE.to_string(),
            session: None,
            token: None,
        }
    }

    /// The `access_token` of the last token response, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().and_then(TokenResponse::access_token)
    }

    /// The `refresh_token` of the last token response, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.token.as_ref().and_then(TokenResponse::refresh_token)
    }

    /// The last token response, verbatim.
    pub fn full_token_response(&self) -> Option<&TokenResponse> {
        self.token.as_ref()
    }

    /// The current authorization session, if an authorize call has run.
    pub fn session(&self) -> Option<&AuthorizationSession> {
        self.session.as_ref()
    }

    /// The HTML served to the browser when the redirect is captured.
    pub fn authorization_response_page(&self) -> &str {
        &self.authorization_response_page
    }

    /// Replace the callback confirmation page.
    pub fn set_authorization_response_page(&mut self, page: impl Into<String>) {
        self.authorization_response_page = page.into();
    }

    /// Authorize interactively with the OS default browser, without
    /// external cancellation.
    pub async fn authorize_in_browser(&mut self, scope: &str, redirect_uri: &str) -> OAuthResult<()> {
        self.authorize_in_browser_with(
            scope,
            redirect_uri,
            BrowserSelector::Default,
            CancellationToken::new(),
        )
        .await
    }

    /// Authorize interactively: build the authorize URL, open the selected
    /// browser, and wait for the loopback redirect to deliver the code.
    ///
    /// On success the session (with its code) replaces any prior session.
    /// On listener failure or cancellation the manager state is unchanged;
    /// a subsequent no-secret token request fails with a configuration
    /// error.
    pub async fn authorize_in_browser_with(
        &mut self,
        scope: &str,
        redirect_uri: &str,
        browser: BrowserSelector,
        cancel: CancellationToken,
    ) -> OAuthResult<()> {
        let redirect_uri =
            Url::parse(redirect_uri).map_err(|_| ProtocolError::InvalidRedirectUri {
                uri: redirect_uri.to_string(),
            })?;

        let mut session = AuthorizationSession::new(generate_state(), redirect_uri.clone());
        let authorize_url = self.build_authorize_url(scope, &session);

        info!(tenant = %self.tenant_url, "starting browser authorization");

        // Bind before launching so a port conflict surfaces without ever
        // opening a browser tab.
        let listener =
            CallbackListener::bind(&redirect_uri, self.authorization_response_page.clone()).await?;

        let handle = self.launcher.launch(&authorize_url, &browser)?;
        let code = listener.wait_for_code(cancel).await;
        // The browser is no longer needed for completion; drop the handle
        // without terminating the process.
        drop(handle);

        let code = code?;
        debug!("authorization code captured");
        session.set_authorization_code(code);
        self.session = Some(session);
        Ok(())
    }

    /// Request an access token from a prior interactive authorization.
    ///
    /// Issues an authorization-code exchange the first time and a
    /// refresh-token exchange once a refresh token is on record. The policy
    /// is keyed solely on refresh-token presence, never on expiry.
    pub async fn request_new_access_token(&mut self) -> OAuthResult<String> {
        let session = self
            .session
            .as_ref()
            .ok_or(ConfigurationError::NotAuthorized)?;
        let code = session
            .authorization_code()
            .ok_or(ConfigurationError::NotAuthorized)?;

        let grant = match self.token.as_ref().and_then(TokenResponse::refresh_token) {
            Some(refresh_token) => GrantRequest::RefreshToken {
                refresh_token: refresh_token.to_string(),
            },
            None => GrantRequest::AuthorizationCode {
                code: code.to_string(),
                code_verifier: session.code_verifier().to_string(),
                redirect_uri: session.redirect_uri().clone(),
            },
        };

        self.exchange_and_store(grant).await
    }

    /// Request an access token with the client-credentials grant. Never
    /// consults session state.
    pub async fn request_new_access_token_with_secret(
        &mut self,
        client_secret: SecretString,
    ) -> OAuthResult<String> {
        self.exchange_and_store(GrantRequest::ClientCredentials { client_secret })
            .await
    }

    /// Request an access token impersonating `subject`.
    pub async fn request_new_access_token_impersonating(
        &mut self,
        client_secret: SecretString,
        subject: &str,
    ) -> OAuthResult<String> {
        self.exchange_and_store(GrantRequest::Impersonation {
            client_secret,
            subject: subject.to_string(),
        })
        .await
    }

    async fn exchange_and_store(&mut self, grant: GrantRequest) -> OAuthResult<String> {
        let grant_type = grant.grant_type();
        let response = self.exchange.exchange(grant).await?;

        info!(grant_type, "token response received");

        // The response replaces the previous one wholesale, even when the
        // access_token lookup below comes up empty.
        self.token = Some(response);

        self.access_token()
            .map(str::to_owned)
            .ok_or_else(|| {
                ProtocolError::MissingField {
                    field: "access_token".to_string(),
                }
                .into()
            })
    }

    fn build_authorize_url(&self, scope: &str, session: &AuthorizationSession) -> String {
        let query = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", session.redirect_uri().as_str()),
            ("scope", scope),
            ("state", session.state()),
            ("code_challenge", session.code_challenge()),
            ("code_challenge_method", "S256"),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

        format!(
            "{}/oauth/authorize?{}",
            self.tenant_url.as_str().trim_end_matches('/'),
            query
        )
    }
}

/// Opaque unguessable state nonce for one authorize call.
fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
