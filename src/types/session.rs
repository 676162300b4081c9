//! Authorization Session
//!
//! Per-authorize state: the PKCE pair, the CSRF state nonce, the redirect
//! URI the callback listener is bound to, and (once captured) the
//! authorization code.

use url::Url;

use crate::core::pkce::PkcePair;

/// State for one interactive authorization.
///
/// Created fresh per authorize call; a new session replaces any prior one.
/// The verifier/challenge are immutable once generated and the code is set
/// exactly once, from the callback listener's result.
#[derive(Clone)]
pub struct AuthorizationSession {
    pkce: PkcePair,
    state: String,
    redirect_uri: Url,
    authorization_code: Option<String>,
}

impl AuthorizationSession {
    /// Create a new session with a fresh PKCE pair and state nonce.
    pub fn new(state: String, redirect_uri: Url) -> Self {
        Self {
            pkce: PkcePair::generate(),
            state,
            redirect_uri,
            authorization_code: None,
        }
    }

    pub fn code_verifier(&self) -> &str {
        &self.pkce.code_verifier
    }

    pub fn code_challenge(&self) -> &str {
        &self.pkce.code_challenge
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    pub fn authorization_code(&self) -> Option<&str> {
        self.authorization_code.as_deref()
    }

    /// Record the code captured by the callback listener.
    pub fn set_authorization_code(&mut self, code: String) {
        self.authorization_code = Some(code);
    }
}

impl std::fmt::Debug for AuthorizationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationSession")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.pkce.code_challenge)
            .field("state", &self.state)
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("has_code", &self.authorization_code.is_some())
            .finish()
    }
}
