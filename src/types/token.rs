//! Token Types
//!
//! The token endpoint returns an arbitrary JSON object; providers add fields
//! freely, so the full document is kept verbatim and the two fields this
//! crate acts on are exposed as derived accessors.

use serde_json::Value;

/// Token response from the authorization server.
///
/// Holds the raw parsed JSON document. `access_token` / `refresh_token` are
/// looked up on demand; a missing key yields `None`, never an error. The
/// whole response is replaced (never merged) on every successful exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenResponse(Value);

impl TokenResponse {
    /// Wrap a parsed token endpoint response.
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// The `access_token` field, if present.
    pub fn access_token(&self) -> Option<&str> {
        self.0.get("access_token").and_then(Value::as_str)
    }

    /// The `refresh_token` field, if present.
    pub fn refresh_token(&self) -> Option<&str> {
        self.0.get("refresh_token").and_then(Value::as_str)
    }

    /// The full response document as returned by the server.
    pub fn document(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for TokenResponse {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}
