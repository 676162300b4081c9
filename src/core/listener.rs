//! Callback Listener
//!
//! One-shot loopback HTTP endpoint that captures the authorization redirect.
//! The listener answers exactly one request on the redirect path and then
//! stops accepting; the socket is released when the wait returns, on every
//! path including cancellation.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{NetworkError, OAuthError, OAuthResult, ProtocolError};

/// Loopback listener bound to the redirect URI.
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
    response_page: String,
}

/// Outcome of one accepted connection.
enum Served {
    /// Redirect-path request handled; the wait is over.
    Resolved(OAuthResult<String>),
    /// Unrelated request (wrong path, unreadable); keep waiting.
    Ignored,
}

impl CallbackListener {
    /// Bind on the redirect URI's host and port.
    ///
    /// A bind failure (port already in use) surfaces here, before any
    /// browser is launched, not from the wait.
    pub async fn bind(redirect_uri: &Url, response_page: String) -> OAuthResult<Self> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| invalid_redirect(redirect_uri))?;
        let port = redirect_uri
            .port_or_known_default()
            .ok_or_else(|| invalid_redirect(redirect_uri))?;

        let addr = format!("{}:{}", host, port);
        let listener =
            TcpListener::bind(&addr)
                .await
                .map_err(|source| NetworkError::BindFailed {
                    addr: addr.clone(),
                    source,
                })?;

        debug!(%addr, "callback listener bound");

        Ok(Self {
            listener,
            path: redirect_uri.path().to_string(),
            response_page,
        })
    }

    /// The bound socket address (the port is useful when binding port 0).
    pub fn local_addr(&self) -> OAuthResult<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|source| NetworkError::BindFailed {
                addr: "local".to_string(),
                source,
            })
            .map_err(OAuthError::from)
    }

    /// Wait for the single redirect carrying the `code` query parameter.
    ///
    /// Resolves at most once. Consuming `self` guarantees the socket is
    /// released when this returns, whether with a code, with a missing-code
    /// failure, or through cancellation.
    pub async fn wait_for_code(self, cancel: CancellationToken) -> OAuthResult<String> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("callback wait cancelled, releasing listener");
                    return Err(OAuthError::Cancelled);
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "failed to accept callback connection");
                            continue;
                        }
                    };
                    debug!(%peer, "callback connection accepted");
                    match self.serve(stream).await {
                        Served::Resolved(result) => return result,
                        Served::Ignored => continue,
                    }
                }
            }
        }
    }

    async fn serve(&self, mut stream: TcpStream) -> Served {
        let mut buffer = vec![0u8; 8192];
        let n = match stream.read(&mut buffer).await {
            Ok(0) => return Served::Ignored,
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "failed to read callback request");
                return Served::Ignored;
            }
        };
        let request = String::from_utf8_lossy(&buffer[..n]);

        let Some(target) = request_target(&request) else {
            let _ = write_response(&mut stream, 404, "text/plain", "not found").await;
            return Served::Ignored;
        };

        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target, None),
        };

        if path != self.path {
            debug!(%path, "ignoring request outside the redirect path");
            let _ = write_response(&mut stream, 404, "text/plain", "not found").await;
            return Served::Ignored;
        }

        // The confirmation page is served whether or not the code is
        // present; the user-facing tab closes either way.
        let _ = write_response(&mut stream, 200, "text/html", &self.response_page).await;

        let code = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
        });

        match code {
            Some(code) => Served::Resolved(Ok(code)),
            None => Served::Resolved(Err(ProtocolError::MissingCode.into())),
        }
    }
}

fn invalid_redirect(redirect_uri: &Url) -> OAuthError {
    ProtocolError::InvalidRedirectUri {
        uri: redirect_uri.to_string(),
    }
    .into()
}

/// Extract the request target from the request line, e.g.
/// `GET /?code=x HTTP/1.1` -> `/?code=x`.
fn request_target(request: &str) -> Option<&str> {
    let first_line = request.lines().next()?;
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?;
    if method != "GET" {
        return None;
    }
    parts.next()
}

async fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) -> std::io::Result<()> {
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
