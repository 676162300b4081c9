//! Qlik Tenant OAuth Client
//!
//! OAuth 2.0 client for tenant-scoped authorization servers, supporting
//! three grant patterns:
//!
//! - Interactive Authorization Code with PKCE (RFC 7636): opens an external
//!   browser and captures the redirect on a one-shot loopback listener.
//! - Client Credentials (RFC 6749 Section 4.4) for machine-to-machine use.
//! - User impersonation (`urn:qlik:oauth:user-impersonation`).
//!
//! # Example
//!
//! ```rust,ignore
//! use qlik_oauth::OAuthManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = OAuthManager::new("https://your-tenant.eu.qlikcloud.com", "client-id")?;
//!
//!     manager
//!         .authorize_in_browser("user_default offline_access", "http://localhost:8123/")
//!         .await?;
//!
//!     let access_token = manager.request_new_access_token().await?;
//!     println!("access token: {}", access_token);
//!
//!     // Later calls refresh automatically once a refresh token is stored.
//!     let refreshed = manager.request_new_access_token().await?;
//!     println!("refreshed: {}", refreshed);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: authorization session, grant requests, token response
//! - `error`: error hierarchy
//! - `core`: infrastructure (HTTP transport, PKCE, callback listener,
//!   browser launching)
//! - `exchange`: token endpoint client
//! - `manager`: high-level manager orchestrating the flows

pub mod core;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod types;

// Re-export the manager
pub use manager::OAuthManager;

// Re-export errors
pub use error::{
    ConfigurationError, NetworkError, OAuthError, OAuthResult, ParseError, ProtocolError,
};

// Re-export types
pub use types::{AuthorizationSession, GrantRequest, TokenResponse};

// Re-export core components
pub use self::core::{
    // Transport
    HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
    // PKCE
    compute_challenge, generate_verifier, PkcePair,
    // Listener
    CallbackListener,
    // Launcher
    BrowserHandle, BrowserLauncher, BrowserSelector, MockBrowserLauncher, ProcessBrowserLauncher,
};

// Re-export the exchange client
pub use exchange::TokenExchangeClient;

// Re-export the cancellation token used by the authorize wait
pub use tokio_util::sync::CancellationToken;
